//! Ordinal-format entry points: positional JSON arrays, no property names
//! on the wire. Callers pick this format explicitly, or land here via
//! [`crate::decode_auto`]'s array-vs-object sniff.

use std::any::Any;

use neatoo_core::{NeatooError, TypeName, WireFormat};
use serde_json::Value;

use crate::codec;
use crate::registry::TypeRegistry;

pub fn encode(registry: &TypeRegistry, type_name: &TypeName, value: &dyn Any) -> Result<Value, NeatooError> {
    codec::encode_root(registry, WireFormat::Ordinal, type_name, value)
}

pub fn decode(
    registry: &TypeRegistry,
    type_name: &TypeName,
    json: &Value,
) -> Result<Box<dyn Any + Send + Sync>, NeatooError> {
    codec::decode_root(registry, WireFormat::Ordinal, type_name, json)
}
