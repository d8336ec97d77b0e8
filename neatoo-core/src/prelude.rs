//! `neatoo-core` prelude — import everything a crate building on the
//! dispatch pipeline typically needs with a single `use`.
//!
//! ```ignore
//! use neatoo_core::prelude::*;
//! ```

pub use crate::config::{ConfigError, ConfigValue, FromConfigValue, NeatooConfig};
pub use crate::correlation::CorrelationId;
pub use crate::error::NeatooError;
pub use crate::resolver::{
    AsyncService, Producer, ResolveError, Service, ServiceRegistry, ServiceScope,
};
pub use crate::types::{
    save_route, Authorized, DelegateName, FactoryOperation, OperationFlags, SaveMeta, SaveRoute,
    TypeName, WireFormat,
};
