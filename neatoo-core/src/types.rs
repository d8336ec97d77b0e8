//! Shared data-model types used across the dispatch pipeline: type and
//! delegate identifiers, the factory operation enum with its capability
//! flags, save routing, and the `Authorized<T>` outcome type.

use std::fmt;

/// A stable, process-wide identifier for a serializable type, e.g.
/// `"acme.Person"`. Opaque to the protocol beyond uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        TypeName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        TypeName::new(s)
    }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self {
        TypeName::new(s)
    }
}

/// A stable identifier for a remote-invocable operation, e.g.
/// `"OrdersFactory.Fetch#int32"`. The exact grammar is left to the
/// application; this type only guarantees equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DelegateName(String);

impl DelegateName {
    pub fn new(name: impl Into<String>) -> Self {
        DelegateName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DelegateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DelegateName {
    fn from(s: &str) -> Self {
        DelegateName::new(s)
    }
}

impl From<String> for DelegateName {
    fn from(s: String) -> Self {
        DelegateName::new(s)
    }
}

bitflags::bitflags! {
    /// Capability flags carried by every [`FactoryOperation`]. Authorization
    /// predicates are tagged with a subset of these flags and match any
    /// operation whose flags intersect theirs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OperationFlags: u32 {
        const CREATE  = 1;
        const FETCH   = 2;
        const INSERT  = 4;
        const UPDATE  = 8;
        const DELETE  = 16;
        const READ    = 64;
        const WRITE   = 128;
        const EXECUTE = 256;
    }
}

/// The closed set of factory operations a delegate can perform, each
/// carrying its capability flags per the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactoryOperation {
    Create,
    Fetch,
    Insert,
    Update,
    Delete,
    Execute,
    Event,
    None,
}

impl FactoryOperation {
    /// The capability flags carried by this operation. `Event` and `None`
    /// carry no flags — they are never subject to the authorization chain.
    pub fn flags(self) -> OperationFlags {
        use OperationFlags as F;
        match self {
            FactoryOperation::Create => F::CREATE | F::READ,
            FactoryOperation::Fetch => F::FETCH | F::READ,
            FactoryOperation::Insert => F::INSERT | F::WRITE,
            FactoryOperation::Update => F::UPDATE | F::WRITE,
            FactoryOperation::Delete => F::DELETE | F::WRITE,
            FactoryOperation::Execute => F::EXECUTE | F::READ,
            FactoryOperation::Event | FactoryOperation::None => F::empty(),
        }
    }
}

impl fmt::Display for FactoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FactoryOperation::Create => "Create",
            FactoryOperation::Fetch => "Fetch",
            FactoryOperation::Insert => "Insert",
            FactoryOperation::Update => "Update",
            FactoryOperation::Delete => "Delete",
            FactoryOperation::Execute => "Execute",
            FactoryOperation::Event => "Event",
            FactoryOperation::None => "None",
        };
        write!(f, "{s}")
    }
}

/// Invariant interface implemented by entities that participate in Save
/// routing. The core inspects `is_new`/`is_deleted` to choose the
/// Insert/Update/Delete/No-op path described in the data model.
pub trait SaveMeta {
    fn is_new(&self) -> bool;
    fn is_deleted(&self) -> bool;
}

/// The four Save-routing outcomes derived from a [`SaveMeta`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveRoute {
    Insert,
    Update,
    Delete,
    /// `IsNew && IsDeleted`: no user method runs; the operation succeeds
    /// immediately with no lifecycle hooks fired.
    NoOp,
}

/// Resolve the Save route for a [`SaveMeta`] value per the data-model
/// table: `(new, deleted) -> route`.
pub fn save_route(meta: &dyn SaveMeta) -> SaveRoute {
    match (meta.is_new(), meta.is_deleted()) {
        (true, false) => SaveRoute::Insert,
        (false, false) => SaveRoute::Update,
        (false, true) => SaveRoute::Delete,
        (true, true) => SaveRoute::NoOp,
    }
}

/// Tagged outcome of an authorization check: either the guarded value (or
/// unit, for the non-generic form) was granted, or it was denied with a
/// human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorized<T> {
    Granted(T),
    Denied(String),
}

impl<T> Authorized<T> {
    pub fn granted(value: T) -> Self {
        Authorized::Granted(value)
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Authorized::Denied(reason.into())
    }

    pub fn has_access(&self) -> bool {
        matches!(self, Authorized::Granted(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Authorized<U> {
        match self {
            Authorized::Granted(v) => Authorized::Granted(f(v)),
            Authorized::Denied(reason) => Authorized::Denied(reason),
        }
    }

    /// Convert to a `Result`, raising `NotAuthorized` on denial — the
    /// propagation policy for non-`TryX` methods.
    pub fn into_result(self) -> Result<T, crate::error::NeatooError> {
        match self {
            Authorized::Granted(v) => Ok(v),
            Authorized::Denied(reason) => Err(crate::error::NeatooError::NotAuthorized(reason)),
        }
    }
}

/// The wire-visible serialization format. Decoders auto-detect by the
/// first non-whitespace byte of a payload; encoders pick one at
/// construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Ordinal,
    Named,
}

impl WireFormat {
    pub fn as_header_value(self) -> &'static str {
        match self {
            WireFormat::Ordinal => "ordinal",
            WireFormat::Named => "named",
        }
    }
}

impl std::str::FromStr for WireFormat {
    type Err = crate::error::NeatooError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ordinal" => Ok(WireFormat::Ordinal),
            "named" => Ok(WireFormat::Named),
            other => Err(crate::error::NeatooError::BadRequest(format!(
                "unknown wire format: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entity {
        new: bool,
        deleted: bool,
    }

    impl SaveMeta for Entity {
        fn is_new(&self) -> bool {
            self.new
        }
        fn is_deleted(&self) -> bool {
            self.deleted
        }
    }

    #[test]
    fn save_routing_matches_table() {
        assert_eq!(
            save_route(&Entity { new: true, deleted: false }),
            SaveRoute::Insert
        );
        assert_eq!(
            save_route(&Entity { new: false, deleted: false }),
            SaveRoute::Update
        );
        assert_eq!(
            save_route(&Entity { new: false, deleted: true }),
            SaveRoute::Delete
        );
        assert_eq!(
            save_route(&Entity { new: true, deleted: true }),
            SaveRoute::NoOp
        );
    }

    #[test]
    fn operation_flags_match_wire_contract() {
        assert_eq!(FactoryOperation::Create.flags().bits(), 1 | 64);
        assert_eq!(FactoryOperation::Fetch.flags().bits(), 2 | 64);
        assert_eq!(FactoryOperation::Insert.flags().bits(), 4 | 128);
        assert_eq!(FactoryOperation::Update.flags().bits(), 8 | 128);
        assert_eq!(FactoryOperation::Delete.flags().bits(), 16 | 128);
        assert_eq!(FactoryOperation::Execute.flags().bits(), 256 | 64);
    }

    #[test]
    fn authorized_denied_raises_not_authorized() {
        let denied: Authorized<i32> = Authorized::denied("forbidden");
        let err = denied.into_result().unwrap_err();
        assert!(matches!(err, crate::error::NeatooError::NotAuthorized(_)));
    }
}
