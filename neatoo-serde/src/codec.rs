//! Shared recursive walk used by both the ordinal and named encoders: owns
//! the reference graph, turns a type's [`EncodedField`]s into a JSON value
//! per the active [`WireFormat`], and the inverse for decoding.
//!
//! The root value passed to a top-level `encode`/`decode` call is never
//! itself wrapped with `$id`/`$ref` — only nested object fields reached by
//! recursing into a parent's properties are reference-tracked. This
//! matches the wire examples in the testable-properties scenarios, where a
//! fetched entity's own result is a bare array/object with no envelope.

use std::any::Any;
use std::sync::Arc;

use neatoo_core::{NeatooError, TypeName, WireFormat};
use serde_json::Value;

use crate::field::{DecodedField, EncodedField};
use crate::reference::{DecodeRefGraph, EncodeRefGraph, EncodeSlot};
use crate::registry::TypeRegistry;

/// Encode `value` (the concrete Rust value behind `type_name`) as the
/// top-level wire body for `format`. Does not attach a `$id`/`$ref`
/// envelope to the root.
pub fn encode_root(
    registry: &TypeRegistry,
    format: WireFormat,
    type_name: &TypeName,
    value: &dyn Any,
) -> Result<Value, NeatooError> {
    let mut graph = EncodeRefGraph::new();
    encode_body(registry, &mut graph, format, type_name, value)
}

/// Decode a top-level wire body for `format` into the registered type
/// named `type_name`.
pub fn decode_root(
    registry: &TypeRegistry,
    format: WireFormat,
    type_name: &TypeName,
    json: &Value,
) -> Result<Box<dyn Any + Send + Sync>, NeatooError> {
    let mut graph = DecodeRefGraph::new();
    decode_body(registry, &mut graph, format, type_name, json)
}

fn encode_body(
    registry: &TypeRegistry,
    graph: &mut EncodeRefGraph,
    format: WireFormat,
    type_name: &TypeName,
    value: &dyn Any,
) -> Result<Value, NeatooError> {
    let handle = registry
        .find_type(type_name)
        .ok_or_else(|| NeatooError::SerializationMismatch(format!("not serializable: {type_name}")))?;
    let fields = handle.metadata.to_fields(value);

    match format {
        WireFormat::Ordinal => {
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                values.push(encode_field(registry, graph, format, field)?);
            }
            Ok(Value::Array(values))
        }
        WireFormat::Named => {
            let mut map = serde_json::Map::with_capacity(fields.len());
            for (name, field) in handle.metadata.property_names.iter().zip(fields) {
                map.insert((*name).to_string(), encode_field(registry, graph, format, field)?);
            }
            Ok(Value::Object(map))
        }
    }
}

fn encode_field(
    registry: &TypeRegistry,
    graph: &mut EncodeRefGraph,
    format: WireFormat,
    field: EncodedField,
) -> Result<Value, NeatooError> {
    match field {
        EncodedField::Scalar(v) => Ok(v),
        EncodedField::Object { type_name, value } => {
            encode_nested(registry, graph, format, &type_name, value)
        }
    }
}

fn encode_nested(
    registry: &TypeRegistry,
    graph: &mut EncodeRefGraph,
    format: WireFormat,
    type_name: &TypeName,
    value: Arc<dyn Any + Send + Sync>,
) -> Result<Value, NeatooError> {
    match graph.slot_for(&value) {
        EncodeSlot::Seen(id) => Ok(serde_json::json!({ "$ref": id })),
        EncodeSlot::First(id) => {
            let body = encode_body(registry, graph, format, type_name, value.as_ref())?;
            Ok(serde_json::json!({
                "$id": id,
                "$type": type_name.to_string(),
                "$value": body,
            }))
        }
    }
}

fn decode_body(
    registry: &TypeRegistry,
    graph: &mut DecodeRefGraph,
    format: WireFormat,
    type_name: &TypeName,
    json: &Value,
) -> Result<Box<dyn Any + Send + Sync>, NeatooError> {
    let handle = registry
        .find_type(type_name)
        .ok_or_else(|| NeatooError::SerializationMismatch(format!("not serializable: {type_name}")))?;
    let property_count = handle.metadata.property_names.len();

    let raw_values: Vec<Value> = match format {
        WireFormat::Ordinal => {
            let arr = json.as_array().ok_or_else(|| {
                NeatooError::SerializationMismatch(format!("expected ordinal array for {type_name}"))
            })?;
            if arr.len() > property_count {
                return Err(NeatooError::SerializationMismatch(format!(
                    "{type_name}: ordinal array has {} entries, metadata declares {property_count}",
                    arr.len()
                )));
            }
            let mut values = arr.clone();
            values.resize(property_count, Value::Null);
            values
        }
        WireFormat::Named => {
            let obj = json.as_object().ok_or_else(|| {
                NeatooError::SerializationMismatch(format!("expected named object for {type_name}"))
            })?;
            handle
                .metadata
                .property_names
                .iter()
                .map(|name| obj.get(*name).cloned().unwrap_or(Value::Null))
                .collect()
        }
    };

    let mut decoded = Vec::with_capacity(raw_values.len());
    for raw in raw_values {
        decoded.push(decode_field(registry, graph, format, raw)?);
    }

    handle.metadata.from_fields(decoded)
}

fn decode_field(
    registry: &TypeRegistry,
    graph: &mut DecodeRefGraph,
    format: WireFormat,
    raw: Value,
) -> Result<DecodedField, NeatooError> {
    match raw {
        Value::Object(ref map) if map.contains_key("$ref") => {
            let id = map["$ref"]
                .as_u64()
                .ok_or_else(|| NeatooError::SerializationMismatch("malformed $ref".into()))?;
            let value = graph
                .resolve(id)
                .ok_or_else(|| NeatooError::SerializationMismatch(format!("unresolved $ref: {id}")))?;
            Ok(DecodedField::Object(value))
        }
        Value::Object(ref map) if map.contains_key("$id") => {
            let id = map["$id"]
                .as_u64()
                .ok_or_else(|| NeatooError::SerializationMismatch("malformed $id".into()))?;
            let type_name = map
                .get("$type")
                .or_else(|| map.get("$t"))
                .and_then(Value::as_str)
                .ok_or_else(|| NeatooError::SerializationMismatch("missing $type on $id node".into()))?;
            let type_name = TypeName::new(type_name);
            let body = map
                .get("$value")
                .or_else(|| map.get("$v"))
                .ok_or_else(|| NeatooError::SerializationMismatch("missing $value on $id node".into()))?;

            let decoded = decode_body(registry, graph, format, &type_name, body)?;
            let shared: Arc<dyn Any + Send + Sync> = Arc::from(decoded);
            graph.insert(id, shared.clone());
            Ok(DecodedField::Object(shared))
        }
        scalar => Ok(DecodedField::Scalar(scalar)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistration;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        active: bool,
        age: i64,
        name: String,
    }

    fn register_person(registry: &mut TypeRegistry) {
        registry
            .register(TypeRegistration::new(
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
                    Ok(Person {
                        active: it.next().unwrap().into_scalar()?.as_bool().unwrap_or_default(),
                        age: it.next().unwrap().into_scalar()?.as_i64().unwrap_or_default(),
                        name: it
                            .next()
                            .unwrap()
                            .into_scalar()?
                            .as_str()
                            .unwrap_or_default()
                            .to_string(),
                    })
                },
            ))
            .unwrap();
    }

    #[test]
    fn ordinal_round_trip() {
        let mut registry = TypeRegistry::new();
        register_person(&mut registry);
        let person = Person { active: true, age: 42, name: "John".into() };

        let encoded = encode_root(&registry, WireFormat::Ordinal, &TypeName::new("acme.Person"), &person).unwrap();
        assert_eq!(encoded, serde_json::json!([true, 42, "John"]));

        let decoded = decode_root(&registry, WireFormat::Ordinal, &TypeName::new("acme.Person"), &encoded).unwrap();
        assert_eq!(*decoded.downcast::<Person>().unwrap(), person);
    }

    #[test]
    fn named_round_trip() {
        let mut registry = TypeRegistry::new();
        register_person(&mut registry);
        let person = Person { active: false, age: 7, name: "Ann".into() };

        let encoded = encode_root(&registry, WireFormat::Named, &TypeName::new("acme.Person"), &person).unwrap();
        assert_eq!(
            encoded,
            serde_json::json!({"Active": false, "Age": 7, "Name": "Ann"})
        );

        let decoded = decode_root(&registry, WireFormat::Named, &TypeName::new("acme.Person"), &encoded).unwrap();
        assert_eq!(*decoded.downcast::<Person>().unwrap(), person);
    }

    #[test]
    fn ordinal_too_many_values_is_mismatch() {
        let mut registry = TypeRegistry::new();
        register_person(&mut registry);
        let too_long = serde_json::json!([true, 1, "x", "extra"]);
        let err = decode_root(&registry, WireFormat::Ordinal, &TypeName::new("acme.Person"), &too_long)
            .unwrap_err();
        assert!(matches!(err, NeatooError::SerializationMismatch(_)));
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Pair {
        left: Arc<Person>,
        right: Arc<Person>,
    }

    fn register_pair(registry: &mut TypeRegistry) {
        registry
            .register(TypeRegistration::new(
                "acme.Pair",
                vec!["Left", "Right"],
                |p: &Pair| {
                    vec![
                        EncodedField::object("acme.Person", p.left.clone()),
                        EncodedField::object("acme.Person", p.right.clone()),
                    ]
                },
                |fields| {
                    let mut it = fields.into_iter();
                    Ok(Pair {
                        left: it.next().unwrap().into_object::<Person>()?,
                        right: it.next().unwrap().into_object::<Person>()?,
                    })
                },
            ))
            .unwrap();
    }

    #[test]
    fn shared_reference_encodes_once_and_decodes_to_same_identity() {
        let mut registry = TypeRegistry::new();
        register_person(&mut registry);
        register_pair(&mut registry);

        let shared = Arc::new(Person { active: true, age: 1, name: "Shared".into() });
        let pair = Pair { left: shared.clone(), right: shared.clone() };

        let encoded = encode_root(&registry, WireFormat::Named, &TypeName::new("acme.Pair"), &pair).unwrap();
        let right = &encoded["Right"];
        assert_eq!(right["$ref"], serde_json::json!(0));

        let decoded = decode_root(&registry, WireFormat::Named, &TypeName::new("acme.Pair"), &encoded).unwrap();
        let decoded = decoded.downcast::<Pair>().unwrap();
        assert!(Arc::ptr_eq(&decoded.left, &decoded.right));
    }

    #[test]
    fn decodes_the_compact_t_v_aliases_in_place_of_type_and_value() {
        let mut registry = TypeRegistry::new();
        register_person(&mut registry);
        register_pair(&mut registry);

        let compact = serde_json::json!({
            "Left": {"$id": 0, "$t": "acme.Person", "$v": [true, 1, "Shared"]},
            "Right": {"$ref": 0},
        });

        let decoded = decode_root(&registry, WireFormat::Named, &TypeName::new("acme.Pair"), &compact).unwrap();
        let decoded = decoded.downcast::<Pair>().unwrap();
        assert_eq!(decoded.left.name, "Shared");
        assert!(Arc::ptr_eq(&decoded.left, &decoded.right));
    }
}
