//! neatoo — a remote-factory RPC runtime.
//!
//! This facade crate re-exports the runtime's sub-crates through a single
//! dependency with feature flags. Most applications only need:
//!
//! ```ignore
//! use neatoo::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature        | Default | Crate            |
//! |----------------|---------|-------------------|
//! | `server`       | **yes** | `neatoo-server`   |
//! | `client`       | **yes** | `neatoo-client`   |
//! | `factory`      | **yes** | `neatoo-factory`  |
//! | `events`       | **yes** | `neatoo-events`   |
//! | `test-support` | no      | `neatoo-test`     |

pub use neatoo_core::*;
pub use neatoo_rpc;
pub use neatoo_serde;

#[cfg(feature = "server")]
pub use neatoo_server;

#[cfg(feature = "client")]
pub use neatoo_client;

#[cfg(feature = "factory")]
pub use neatoo_factory;

#[cfg(feature = "events")]
pub use neatoo_events;

#[cfg(feature = "test-support")]
pub use neatoo_test;

/// Unified prelude — `use neatoo::prelude::*` pulls in the envelope types,
/// the delegate registry, and (when enabled) the factory and client APIs.
pub mod prelude {
    pub use neatoo_core::{
        Authorized, CorrelationId, DelegateName, FactoryOperation, NeatooConfig, NeatooError,
        OperationFlags, SaveMeta, SaveRoute, ServiceRegistry, ServiceScope, TypeName, WireFormat,
    };
    pub use neatoo_rpc::{DelegateRegistry, DispatchContext, RemoteRequest, RemoteResponse};

    #[cfg(feature = "factory")]
    pub use neatoo_factory::{
        run, run_save, AuthorizationContext, AuthorizationPredicate, LifecycleHooks, Principal,
        RolesPredicate,
    };

    #[cfg(feature = "server")]
    pub use neatoo_server::AppState;

    #[cfg(feature = "client")]
    pub use neatoo_client::NeatooClient;

    #[cfg(feature = "events")]
    pub use neatoo_events::EventScheduler;
}
