pub mod config;
pub mod correlation;
pub mod error;
pub mod prelude;
pub mod resolver;
pub mod types;

pub use config::{ConfigError, ConfigValue, FromConfigValue, NeatooConfig, SecretResolver};
pub use correlation::CorrelationId;
pub use error::NeatooError;
pub use resolver::{AsyncService, Producer, ResolveError, Service, ServiceRegistry, ServiceScope};
pub use types::{
    save_route, Authorized, DelegateName, FactoryOperation, OperationFlags, SaveMeta, SaveRoute,
    TypeName, WireFormat,
};
