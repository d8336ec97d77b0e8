//! Dual-format polymorphic JSON serializer for neatoo wire payloads.
//!
//! A type registers its [`registry::OrdinalMetadata`] once; the same
//! registration then drives both the ordinal (positional array) and named
//! (keyed object) wire encodings, plus the `$id`/`$ref` reference graph
//! that keeps a shared object from being duplicated on the wire.

mod codec;
pub mod field;
pub mod named;
pub mod ordinal;
pub mod reference;
pub mod registry;

pub use field::{DecodedField, EncodedField};
pub use reference::{DecodeRefGraph, EncodeRefGraph, EncodeSlot};
pub use registry::{OrdinalMetadata, RegistryError, TypeHandle, TypeRegistration, TypeRegistry};

use std::any::Any;

use neatoo_core::{NeatooError, TypeName, WireFormat};
use serde_json::Value;

/// Sniff the wire format from the first non-whitespace byte of a raw
/// payload: `[` is ordinal, `{` is named. Neither prefix is an error on
/// its own — an empty or malformed payload is left for the parser to
/// reject with a clearer message.
pub fn detect_format(raw: &str) -> Option<WireFormat> {
    raw.trim_start().chars().next().and_then(|c| match c {
        '[' => Some(WireFormat::Ordinal),
        '{' => Some(WireFormat::Named),
        _ => None,
    })
}

/// Parse `raw` and decode it into `type_name`, picking ordinal or named
/// decoding by sniffing the payload's leading character rather than
/// requiring the caller to already know the format.
pub fn decode_auto(
    registry: &TypeRegistry,
    type_name: &TypeName,
    raw: &str,
) -> Result<Box<dyn Any + Send + Sync>, NeatooError> {
    let format = detect_format(raw)
        .ok_or_else(|| NeatooError::BadRequest("payload is neither an ordinal array nor a named object".into()))?;
    let json: Value = serde_json::from_str(raw)
        .map_err(|e| NeatooError::BadRequest(format!("invalid JSON payload: {e}")))?;
    codec::decode_root(registry, format, type_name, &json)
}

/// Encode `value` in the requested `format`.
pub fn encode(
    registry: &TypeRegistry,
    format: WireFormat,
    type_name: &TypeName,
    value: &dyn Any,
) -> Result<Value, NeatooError> {
    codec::encode_root(registry, format, type_name, value)
}

/// Decode `json` (already parsed) as `format`.
pub fn decode(
    registry: &TypeRegistry,
    format: WireFormat,
    type_name: &TypeName,
    json: &Value,
) -> Result<Box<dyn Any + Send + Sync>, NeatooError> {
    codec::decode_root(registry, format, type_name, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_ordinal_and_named_by_leading_char() {
        assert!(matches!(detect_format(" \n [1,2]"), Some(WireFormat::Ordinal)));
        assert!(matches!(detect_format("{\"a\":1}"), Some(WireFormat::Named)));
        assert_eq!(detect_format("null"), None);
    }
}
