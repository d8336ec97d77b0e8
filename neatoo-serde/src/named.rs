//! Named-format entry points: JSON objects keyed by property name.

use std::any::Any;

use neatoo_core::{NeatooError, TypeName, WireFormat};
use serde_json::Value;

use crate::codec;
use crate::registry::TypeRegistry;

pub fn encode(registry: &TypeRegistry, type_name: &TypeName, value: &dyn Any) -> Result<Value, NeatooError> {
    codec::encode_root(registry, WireFormat::Named, type_name, value)
}

pub fn decode(
    registry: &TypeRegistry,
    type_name: &TypeName,
    json: &Value,
) -> Result<Box<dyn Any + Send + Sync>, NeatooError> {
    codec::decode_root(registry, WireFormat::Named, type_name, json)
}
