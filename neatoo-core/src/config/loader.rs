use std::collections::HashMap;
use std::path::Path;

use super::value::ConfigValue;
use super::ConfigError;

/// Read and flatten a YAML file at `path` into `out`. A missing file is not
/// an error — `application-{profile}.yaml` is optional by design.
pub(crate) fn load_yaml_file(path: &Path, out: &mut HashMap<String, ConfigValue>) -> Result<(), ConfigError> {
    if !path.exists() {
        return Ok(());
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Load(e.to_string()))?;
    load_yaml_str(&content, out)
}

/// Parse a YAML document and flatten it into `out`, overwriting keys that
/// already exist (later loads win, matching the layering order in
/// [`super::NeatooConfig::load_with_resolver`]).
pub(crate) fn load_yaml_str(content: &str, out: &mut HashMap<String, ConfigValue>) -> Result<(), ConfigError> {
    let document: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    flatten_yaml("", &document, out);
    Ok(())
}

/// Turn a nested YAML tree into dot-separated keys (`neatoo.events.concurrency`),
/// the same shape an environment variable (`NEATOO_EVENTS_CONCURRENCY`)
/// collapses to once lower-cased and `_` becomes `.`.
pub(crate) fn flatten_yaml(prefix: &str, node: &serde_yaml::Value, out: &mut HashMap<String, ConfigValue>) {
    match node {
        serde_yaml::Value::Mapping(entries) => {
            for (key, value) in entries {
                let key = match key {
                    serde_yaml::Value::String(s) => s.clone(),
                    other => format!("{other:?}"),
                };
                let joined = join_key(prefix, &key);
                flatten_yaml(&joined, value, out);
            }
        }
        serde_yaml::Value::Sequence(items) if !prefix.is_empty() => {
            // The list as a whole is addressable under the parent key, and
            // each element is also addressable by index for callers that
            // only need one entry (`neatoo.hosts.0`).
            out.insert(prefix.to_string(), ConfigValue::List(items.iter().map(ConfigValue::from_yaml).collect()));
            for (index, item) in items.iter().enumerate() {
                flatten_yaml(&join_key(prefix, &index.to_string()), item, out);
            }
        }
        serde_yaml::Value::Sequence(_) => {}
        leaf if !prefix.is_empty() => {
            out.insert(prefix.to_string(), ConfigValue::from_yaml(leaf));
        }
        _ => {}
    }
}

fn join_key(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_mappings_to_dotted_keys() {
        let mut out = HashMap::new();
        load_yaml_str("neatoo:\n  events:\n    concurrency: 64\n", &mut out).unwrap();
        assert!(matches!(out.get("neatoo.events.concurrency"), Some(ConfigValue::Integer(64))));
    }

    #[test]
    fn sequence_is_addressable_whole_and_by_index() {
        let mut out = HashMap::new();
        load_yaml_str("neatoo:\n  hosts:\n    - a\n    - b\n", &mut out).unwrap();
        assert!(matches!(out.get("neatoo.hosts"), Some(ConfigValue::List(items)) if items.len() == 2));
        assert!(matches!(out.get("neatoo.hosts.0"), Some(ConfigValue::String(s)) if s == "a"));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let mut out = HashMap::new();
        load_yaml_file(Path::new("/nonexistent/application.yaml"), &mut out).unwrap();
        assert!(out.is_empty());
    }
}
