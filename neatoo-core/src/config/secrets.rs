use super::ConfigError;

/// Backend for resolving a `${...}` placeholder found inside a config value.
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError>;
}

/// `${VAR}` / `${env:VAR}` resolve from the process environment;
/// `${file:/path}` reads a file and trims trailing whitespace (the usual
/// shape for a mounted Kubernetes secret or Docker secret file).
pub struct DefaultSecretResolver;

impl SecretResolver for DefaultSecretResolver {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError> {
        let reference = reference.trim();
        if let Some(path) = reference.strip_prefix("file:") {
            let path = path.trim();
            std::fs::read_to_string(path)
                .map(|contents| contents.trim().to_string())
                .map_err(|e| ConfigError::Load(format!("secret file '{path}': {e}")))
        } else {
            let var = reference.strip_prefix("env:").unwrap_or(reference).trim();
            std::env::var(var).map_err(|_| ConfigError::NotFound(format!("env:{var}")))
        }
    }
}

/// Expand every `${...}` placeholder in `value`, left to right, calling
/// `resolver` once per placeholder found.
pub fn resolve_placeholders(value: &str, resolver: &dyn SecretResolver) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let Some(close) = rest[start..].find('}') else {
            return Err(ConfigError::Load(format!("unclosed '${{' placeholder in: {value}")));
        };
        let end = start + close;
        out.push_str(&rest[..start]);
        out.push_str(&resolver.resolve(&rest[start + 2..end])?);
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubResolver;

    impl SecretResolver for StubResolver {
        fn resolve(&self, reference: &str) -> Result<String, ConfigError> {
            Ok(format!("resolved({reference})"))
        }
    }

    #[test]
    fn expands_multiple_placeholders_left_to_right() {
        let out = resolve_placeholders("pre-${a}-mid-${b}-post", &StubResolver).unwrap();
        assert_eq!(out, "pre-resolved(a)-mid-resolved(b)-post");
    }

    #[test]
    fn unclosed_placeholder_is_a_load_error() {
        let err = resolve_placeholders("${unterminated", &StubResolver).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn value_with_no_placeholder_passes_through() {
        assert_eq!(resolve_placeholders("plain-value", &StubResolver).unwrap(), "plain-value");
    }
}
