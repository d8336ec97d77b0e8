//! Per-property encoding produced by a type's `to_ordinal`/`from_ordinal`
//! functions. A property is either an inline scalar (already a
//! `serde_json::Value`) or a nested, reference-tracked object.
//!
//! Every object field carries its concrete [`TypeName`] on the wire
//! (folded into the `$id`/`$ref` wrapper — see `codec`), whether or not
//! the field's static type is an interface. This lets the codec decode
//! nested objects without a separate `PropertyTypes` side table: an
//! interface-typed field simply accepts whatever concrete type comes back,
//! while a concretely-typed field's `from_fields` rejects a mismatching
//! concrete type via [`DecodedField::into_object`].

use std::any::Any;
use std::sync::Arc;

use neatoo_core::TypeName;

/// One property value as produced by a registered type's `to_ordinal`.
pub enum EncodedField {
    Scalar(serde_json::Value),
    Object {
        type_name: TypeName,
        value: Arc<dyn Any + Send + Sync>,
    },
}

impl EncodedField {
    pub fn scalar(value: impl Into<serde_json::Value>) -> Self {
        EncodedField::Scalar(value.into())
    }

    pub fn object<T: Send + Sync + 'static>(type_name: impl Into<TypeName>, value: Arc<T>) -> Self {
        EncodedField::Object {
            type_name: type_name.into(),
            value,
        }
    }
}

/// One property value as reconstructed by the codec, handed to a
/// registered type's `from_ordinal`.
pub enum DecodedField {
    Scalar(serde_json::Value),
    Object(Arc<dyn Any + Send + Sync>),
}

impl DecodedField {
    pub fn into_scalar(self) -> Result<serde_json::Value, neatoo_core::NeatooError> {
        match self {
            DecodedField::Scalar(v) => Ok(v),
            DecodedField::Object(_) => Err(neatoo_core::NeatooError::SerializationMismatch(
                "expected scalar field, found nested object".into(),
            )),
        }
    }

    pub fn into_object<T: Send + Sync + 'static>(self) -> Result<Arc<T>, neatoo_core::NeatooError> {
        match self {
            DecodedField::Object(v) => v.downcast::<T>().map_err(|_| {
                neatoo_core::NeatooError::SerializationMismatch(
                    "nested object downcast to unexpected type".into(),
                )
            }),
            DecodedField::Scalar(_) => Err(neatoo_core::NeatooError::SerializationMismatch(
                "expected nested object, found scalar field".into(),
            )),
        }
    }
}
