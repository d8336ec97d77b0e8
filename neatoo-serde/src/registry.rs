//! The type registry: maps stable [`TypeName`]s to runtime type handles,
//! and supplies each handle's ordinal metadata and factory constructor.
//!
//! Grounded on the same write-once, read-many registration pattern as
//! `neatoo_core::resolver::ServiceRegistry`, but keyed by the wire-visible
//! [`TypeName`] string rather than `TypeId`, since the wire carries opaque
//! type names that must resolve at decode time (§9: "runtime type
//! discovery by name" is a deliberate constraint, not a gap).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use neatoo_core::{NeatooError, ServiceScope, TypeName};

use crate::field::{DecodedField, EncodedField};

/// Per-type metadata the serializer needs: the ordered property list plus
/// the to/from-ordinal conversion functions. Property order must already
/// satisfy the wire invariant (alphabetical, base-before-derived) — the
/// registry does not reorder it.
pub struct OrdinalMetadata {
    pub property_names: Vec<&'static str>,
    to_fields: Box<dyn Fn(&dyn Any) -> Vec<EncodedField> + Send + Sync>,
    from_fields:
        Box<dyn Fn(Vec<DecodedField>) -> Result<Box<dyn Any + Send + Sync>, NeatooError> + Send + Sync>,
}

impl OrdinalMetadata {
    pub fn to_fields(&self, value: &dyn Any) -> Vec<EncodedField> {
        (self.to_fields)(value)
    }

    pub fn from_fields(
        &self,
        fields: Vec<DecodedField>,
    ) -> Result<Box<dyn Any + Send + Sync>, NeatooError> {
        (self.from_fields)(fields)
    }
}

type Constructor = Arc<dyn Fn(&ServiceScope) -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// A registered type: its concrete `TypeId` (for downcasting decoded
/// values), its ordinal metadata, and the constructor used when the
/// registry itself must build an instance (e.g. from a `[Service]`-only
/// factory operation).
pub struct TypeHandle {
    pub type_id: TypeId,
    pub metadata: Arc<OrdinalMetadata>,
    constructor: Option<Constructor>,
}

/// Builder for [`OrdinalMetadata`] plus registration into a [`TypeRegistry`].
pub struct TypeRegistration<T> {
    name: TypeName,
    property_names: Vec<&'static str>,
    to_fields: Box<dyn Fn(&T) -> Vec<EncodedField> + Send + Sync>,
    from_fields: Box<dyn Fn(Vec<DecodedField>) -> Result<T, NeatooError> + Send + Sync>,
    constructor: Option<Arc<dyn Fn(&ServiceScope) -> T + Send + Sync>>,
}

impl<T: Send + Sync + 'static> TypeRegistration<T> {
    pub fn new(
        name: impl Into<TypeName>,
        property_names: Vec<&'static str>,
        to_fields: impl Fn(&T) -> Vec<EncodedField> + Send + Sync + 'static,
        from_fields: impl Fn(Vec<DecodedField>) -> Result<T, NeatooError> + Send + Sync + 'static,
    ) -> Self {
        TypeRegistration {
            name: name.into(),
            property_names,
            to_fields: Box::new(to_fields),
            from_fields: Box::new(from_fields),
            constructor: None,
        }
    }

    pub fn with_constructor(mut self, ctor: impl Fn(&ServiceScope) -> T + Send + Sync + 'static) -> Self {
        self.constructor = Some(Arc::new(ctor));
        self
    }
}

/// Errors raised while registering a type. Duplicate names "fail loudly"
/// per the type registry's contract.
#[derive(Debug)]
pub enum RegistryError {
    DuplicateTypeName(TypeName),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DuplicateTypeName(name) => {
                write!(f, "type name '{name}' registered twice")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Write-once, read-many map from [`TypeName`] to [`TypeHandle`]. Callers
/// populate it at startup (in place of a compile-time code generator) and
/// never mutate it on the request-handling hot path.
#[derive(Default)]
pub struct TypeRegistry {
    by_name: HashMap<TypeName, TypeHandle>,
    names_by_type_id: HashMap<TypeId, TypeName>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a concrete type's ordinal metadata and (optional)
    /// constructor. Fails if the name was already registered.
    pub fn register<T: Send + Sync + 'static>(
        &mut self,
        reg: TypeRegistration<T>,
    ) -> Result<(), RegistryError> {
        if self.by_name.contains_key(&reg.name) {
            return Err(RegistryError::DuplicateTypeName(reg.name));
        }

        let to_fields = reg.to_fields;
        let from_fields = reg.from_fields;
        let metadata = Arc::new(OrdinalMetadata {
            property_names: reg.property_names,
            to_fields: Box::new(move |any| {
                let value = any
                    .downcast_ref::<T>()
                    .expect("type registry invariant: handle type matches registration");
                to_fields(value)
            }),
            from_fields: Box::new(move |fields| {
                from_fields(fields).map(|v| Box::new(v) as Box<dyn Any + Send + Sync>)
            }),
        });

        let constructor: Option<Constructor> = reg.constructor.map(|ctor| {
            Arc::new(move |scope: &ServiceScope| Box::new(ctor(scope)) as Box<dyn Any + Send + Sync>)
                as Constructor
        });

        self.names_by_type_id.insert(TypeId::of::<T>(), reg.name.clone());
        self.by_name.insert(
            reg.name,
            TypeHandle {
                type_id: TypeId::of::<T>(),
                metadata,
                constructor,
            },
        );
        Ok(())
    }

    /// Used by the serializer when it reads a `$type` discriminator.
    pub fn find_type(&self, name: &TypeName) -> Option<&TypeHandle> {
        self.by_name.get(name)
    }

    /// Inverse of [`find_type`](Self::find_type): recover the wire name for
    /// a concrete Rust type.
    pub fn type_name<T: 'static>(&self) -> Option<&TypeName> {
        self.names_by_type_id.get(&TypeId::of::<T>())
    }

    /// Construct a registered type via its constructor, satisfying
    /// `[Service]` parameters from `scope`. Fails with `MissingService` if
    /// the type has no registered constructor (the registry never falls
    /// back to reflection).
    pub fn construct(
        &self,
        name: &TypeName,
        scope: &ServiceScope,
    ) -> Result<Box<dyn Any + Send + Sync>, NeatooError> {
        let handle = self
            .find_type(name)
            .ok_or_else(|| NeatooError::UnknownDelegate(name.to_string()))?;
        let ctor = handle
            .constructor
            .as_ref()
            .ok_or_else(|| NeatooError::MissingService(format!("no constructor for {name}")))?;
        Ok(ctor(scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        active: bool,
        age: i64,
        name: String,
    }

    fn person_registration() -> TypeRegistration<Person> {
        TypeRegistration::new(
            "acme.Person",
            vec!["Active", "Age", "Name"],
            |p: &Person| {
                vec![
                    EncodedField::scalar(p.active),
                    EncodedField::scalar(p.age),
                    EncodedField::scalar(p.name.clone()),
                ]
            },
            |fields| {
                let mut it = fields.into_iter();
                let active = it.next().unwrap().into_scalar()?.as_bool().unwrap_or_default();
                let age = it.next().unwrap().into_scalar()?.as_i64().unwrap_or_default();
                let name = it
                    .next()
                    .unwrap()
                    .into_scalar()?
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                Ok(Person { active, age, name })
            },
        )
    }

    #[test]
    fn registers_and_finds_by_name() {
        let mut registry = TypeRegistry::new();
        registry.register(person_registration()).unwrap();

        let handle = registry.find_type(&TypeName::new("acme.Person")).unwrap();
        assert_eq!(handle.metadata.property_names, vec!["Active", "Age", "Name"]);
    }

    #[test]
    fn duplicate_registration_fails_loudly() {
        let mut registry = TypeRegistry::new();
        registry.register(person_registration()).unwrap();
        let err = registry.register(person_registration()).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTypeName(_)));
    }

    #[test]
    fn type_name_reverse_lookup() {
        let mut registry = TypeRegistry::new();
        registry.register(person_registration()).unwrap();
        assert_eq!(registry.type_name::<Person>(), Some(&TypeName::new("acme.Person")));
    }
}
