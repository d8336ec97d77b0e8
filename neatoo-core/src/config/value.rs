use std::collections::HashMap;

use super::ConfigError;

/// A leaf or nested value pulled out of a YAML document or an environment
/// variable, before it's been converted into the caller's requested type.
#[derive(Debug, Clone)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
    List(Vec<ConfigValue>),
    Map(HashMap<String, ConfigValue>),
}

impl ConfigValue {
    pub(crate) fn from_yaml(node: &serde_yaml::Value) -> Self {
        match node {
            serde_yaml::Value::Bool(b) => ConfigValue::Bool(*b),
            serde_yaml::Value::Number(n) => n
                .as_i64()
                .map(ConfigValue::Integer)
                .or_else(|| n.as_f64().map(ConfigValue::Float))
                .unwrap_or_else(|| ConfigValue::String(n.to_string())),
            serde_yaml::Value::String(s) => ConfigValue::String(s.clone()),
            serde_yaml::Value::Null => ConfigValue::Null,
            serde_yaml::Value::Sequence(items) => {
                ConfigValue::List(items.iter().map(ConfigValue::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(entries) => {
                let map = entries
                    .iter()
                    .map(|(k, v)| (yaml_key_to_string(k), ConfigValue::from_yaml(v)))
                    .collect();
                ConfigValue::Map(map)
            }
            other => ConfigValue::String(format!("{other:?}")),
        }
    }
}

fn yaml_key_to_string(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        other => format!("{other:?}"),
    }
}

/// Converts a [`ConfigValue`] into a concrete Rust type, reporting the
/// offending key on mismatch so a bad `application.yaml` entry points
/// straight at the line that needs fixing.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be used as a config value type",
    label = "not a valid config value type",
    note = "built-in types: String, i64, f64, bool, Option<T>, Vec<T>. Implement `FromConfigValue` for custom types."
)]
pub trait FromConfigValue: Sized {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError>;
}

fn type_mismatch(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::TypeMismatch { key: key.to_string(), expected }
}

impl FromConfigValue for String {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::String(s) => Ok(s.clone()),
            ConfigValue::Integer(i) => Ok(i.to_string()),
            ConfigValue::Float(f) => Ok(f.to_string()),
            ConfigValue::Bool(b) => Ok(b.to_string()),
            ConfigValue::Null | ConfigValue::List(_) | ConfigValue::Map(_) => Err(type_mismatch(key, "String")),
        }
    }
}

impl FromConfigValue for i64 {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::Integer(i) => Ok(*i),
            ConfigValue::String(s) => s.parse().map_err(|_| type_mismatch(key, "i64")),
            _ => Err(type_mismatch(key, "i64")),
        }
    }
}

impl FromConfigValue for f64 {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::Float(f) => Ok(*f),
            ConfigValue::Integer(i) => Ok(*i as f64),
            ConfigValue::String(s) => s.parse().map_err(|_| type_mismatch(key, "f64")),
            _ => Err(type_mismatch(key, "f64")),
        }
    }
}

impl FromConfigValue for bool {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::Bool(b) => Ok(*b),
            ConfigValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(type_mismatch(key, "bool")),
            },
            _ => Err(type_mismatch(key, "bool")),
        }
    }
}

impl<T: FromConfigValue> FromConfigValue for Option<T> {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::Null => Ok(None),
            other => T::from_config_value(other, key).map(Some),
        }
    }
}

impl<T: FromConfigValue> FromConfigValue for Vec<T> {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| T::from_config_value(v, &format!("{key}[{i}]")))
                .collect(),
            // A scalar under a list-typed key is treated as a one-element list,
            // so `neatoo.events.handlers: foo` and `neatoo.events.handlers: [foo]`
            // parse the same way.
            scalar => Ok(vec![T::from_config_value(scalar, key)?]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_coerces_to_single_element_vec() {
        let value = ConfigValue::String("admin".into());
        let roles: Vec<String> = FromConfigValue::from_config_value(&value, "roles").unwrap();
        assert_eq!(roles, vec!["admin".to_string()]);
    }

    #[test]
    fn bool_accepts_common_string_spellings() {
        for (text, expected) in [("true", true), ("YES", true), ("0", false), ("no", false)] {
            let value = ConfigValue::String(text.to_string());
            assert_eq!(bool::from_config_value(&value, "flag").unwrap(), expected);
        }
    }

    #[test]
    fn null_is_none_for_option() {
        let value = ConfigValue::Null;
        let result: Option<i64> = FromConfigValue::from_config_value(&value, "k").unwrap();
        assert_eq!(result, None);
    }
}
