//! The error taxonomy propagated on the wire inside a `RemoteResponse`'s
//! `Error` variant. Each kind names where it is raised; the dispatcher
//! never leaks an implementation-specific payload beyond kind + message.

/// A response-envelope error kind plus message. Serializes as
/// `{"kind": ..., "message": ...}` on the wire (see `neatoo-rpc::envelope`).
#[derive(Clone, PartialEq, Eq)]
pub enum NeatooError {
    /// Envelope malformed or missing fields. Raised by the dispatcher
    /// before it attempts to resolve a delegate.
    BadRequest(String),
    /// `DelegateName` not registered. Raised by the dispatcher's lookup.
    UnknownDelegate(String),
    /// Ordinal length mismatch, unknown `$type`, or malformed `$ref`.
    /// Raised by the serializer.
    SerializationMismatch(String),
    /// The resolver could not supply a `[Service]` slot. Raised while the
    /// dispatcher builds the invocation scope.
    MissingService(String),
    /// Authorization chain denied the operation. Carries the denial reason.
    NotAuthorized(String),
    /// The operation observed cancellation.
    Canceled,
    /// Save routed to Insert/Update/Delete without a registered method.
    SaveNotSupported(String),
    /// Any user-method error, carried kind-agnostic to the wire.
    Domain(String),
}

impl NeatooError {
    /// The stable kind string carried on the wire (distinct from the
    /// human-readable message).
    pub fn kind(&self) -> &'static str {
        match self {
            NeatooError::BadRequest(_) => "BadRequest",
            NeatooError::UnknownDelegate(_) => "UnknownDelegate",
            NeatooError::SerializationMismatch(_) => "SerializationMismatch",
            NeatooError::MissingService(_) => "MissingService",
            NeatooError::NotAuthorized(_) => "NotAuthorized",
            NeatooError::Canceled => "Canceled",
            NeatooError::SaveNotSupported(_) => "SaveNotSupported",
            NeatooError::Domain(_) => "Domain",
        }
    }

    /// The human-readable message, empty for the message-less `Canceled`
    /// variant.
    pub fn message(&self) -> String {
        match self {
            NeatooError::BadRequest(msg)
            | NeatooError::UnknownDelegate(msg)
            | NeatooError::SerializationMismatch(msg)
            | NeatooError::MissingService(msg)
            | NeatooError::NotAuthorized(msg)
            | NeatooError::SaveNotSupported(msg)
            | NeatooError::Domain(msg) => msg.clone(),
            NeatooError::Canceled => String::new(),
        }
    }
}

impl std::fmt::Display for NeatooError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NeatooError::Canceled => write!(f, "Canceled"),
            other => write!(f, "{}: {}", other.kind(), other.message()),
        }
    }
}

impl std::fmt::Debug for NeatooError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for NeatooError {}

impl From<std::io::Error> for NeatooError {
    fn from(err: std::io::Error) -> Self {
        NeatooError::Domain(err.to_string())
    }
}

impl From<serde_json::Error> for NeatooError {
    fn from(err: serde_json::Error) -> Self {
        NeatooError::SerializationMismatch(err.to_string())
    }
}

impl From<crate::config::ConfigError> for NeatooError {
    fn from(err: crate::config::ConfigError) -> Self {
        NeatooError::Domain(err.to_string())
    }
}

/// Generate `From<E> for NeatooError` implementations that map an error
/// type to a specific variant.
///
/// ```ignore
/// neatoo_core::map_error! {
///     sqlx::Error => Domain,
///     std::fmt::Error => Domain,
/// }
/// ```
#[macro_export]
macro_rules! map_error {
    ( $( $err_ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$err_ty> for $crate::error::NeatooError {
                fn from(err: $err_ty) -> Self {
                    $crate::error::NeatooError::$variant(err.to_string())
                }
            }
        )*
    };
}
