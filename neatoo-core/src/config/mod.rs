mod loader;
pub mod secrets;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

pub use secrets::{DefaultSecretResolver, SecretResolver};
pub use value::{ConfigValue, FromConfigValue};

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Ambient runtime configuration: HTTP bind address, default wire format,
/// event-drain timeout, event concurrency limit, plus anything else an
/// application layers on top.
///
/// Loaded from `application.yaml`, `application-{profile}.yaml`, `.env`
/// files, then environment variables, in that priority order.
///
/// Profile is determined by: `NEATOO_PROFILE` env var > argument > `"dev"`.
#[derive(Debug, Clone)]
pub struct NeatooConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl NeatooConfig {
    /// Load configuration for the given profile with a custom secret resolver.
    pub fn load_with_resolver(
        profile: &str,
        resolver: &dyn SecretResolver,
    ) -> Result<Self, ConfigError> {
        let active_profile =
            std::env::var("NEATOO_PROFILE").unwrap_or_else(|_| profile.to_string());

        let mut values = HashMap::new();

        loader::load_yaml_file(Path::new("application.yaml"), &mut values)?;

        let profile_path = format!("application-{active_profile}.yaml");
        loader::load_yaml_file(Path::new(&profile_path), &mut values)?;

        let _ = dotenvy::dotenv();
        let profile_env = format!(".env.{active_profile}");
        let _ = dotenvy::from_filename(&profile_env);

        resolve_string_values(&mut values, resolver)?;

        for (env_key, env_val) in std::env::vars() {
            let config_key = env_key.to_lowercase().replace('_', ".");
            values.insert(config_key, ConfigValue::String(env_val));
        }

        Ok(NeatooConfig {
            values,
            profile: active_profile,
        })
    }

    /// Load configuration for the given profile (default resolver: env + file).
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_with_resolver(profile, &DefaultSecretResolver)
    }

    /// Create a config from a YAML string (useful for testing).
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(NeatooConfig {
            values,
            profile: profile.to_string(),
        })
    }

    /// Create an empty config (useful for testing).
    pub fn empty() -> Self {
        NeatooConfig {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    /// Set a value programmatically.
    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Get a typed value for the given dot-separated key.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Get a typed value, returning a default if the key is missing.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    /// Check whether a key exists in the config.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The active profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// The configured HTTP bind address, default `127.0.0.1:4000`.
    pub fn bind_addr(&self) -> String {
        self.get_or("neatoo.bind_addr", "127.0.0.1:4000".to_string())
    }

    /// The server's preferred wire format, default `ordinal`.
    pub fn default_format(&self) -> crate::types::WireFormat {
        match self.get_or("neatoo.format".to_string().as_str(), "ordinal".to_string()).as_str() {
            "named" => crate::types::WireFormat::Named,
            _ => crate::types::WireFormat::Ordinal,
        }
    }

    /// Timeout, in milliseconds, the event scheduler waits for outstanding
    /// tasks to drain during shutdown before giving up.
    pub fn event_drain_timeout_ms(&self) -> u64 {
        self.get_or("neatoo.events.drain_timeout_ms", 5_000i64) as u64
    }

    /// Maximum number of event handlers allowed to run concurrently.
    pub fn event_concurrency(&self) -> i64 {
        self.get_or("neatoo.events.concurrency", 1024)
    }
}

/// Resolve `${...}` placeholders in all string values of the config map.
fn resolve_string_values(
    values: &mut HashMap<String, ConfigValue>,
    resolver: &dyn SecretResolver,
) -> Result<(), ConfigError> {
    let keys: Vec<String> = values.keys().cloned().collect();
    for key in keys {
        if let Some(ConfigValue::String(s)) = values.get(&key) {
            if s.contains("${") {
                let resolved = secrets::resolve_placeholders(s, resolver)?;
                values.insert(key, ConfigValue::String(resolved));
            }
        }
    }
    Ok(())
}
