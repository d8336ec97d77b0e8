//! Wire envelopes and the server-side delegate registry shared by
//! `neatoo-server` and `neatoo-client`.

pub mod context;
pub mod envelope;
pub mod headers;
pub mod registry;

pub use context::DispatchContext;
pub use envelope::{RemoteRequest, RemoteResponse};
pub use headers::{CORRELATION_HEADER, FORMAT_HEADER};
pub use registry::{DelegateHandler, DelegateRegistry, DelegateRegistryError};
