//! Wire-level DTOs for a remote delegate invocation (§3/§4.4/§6).
//!
//! `CorrelationId` and the negotiated wire format are deliberately absent
//! from these types: they travel as HTTP headers (`X-Correlation-Id`,
//! `X-Neatoo-Format`) so transport middleware can read them without
//! parsing the body, the same separation an HTTP error type keeps between
//! its JSON payload and its status code.

use neatoo_core::{DelegateName, NeatooError};
use serde_json::Value;

/// `{ DelegateName, Parameters[] }`. `parameters` excludes `[Service]`
/// arguments and the cancellation slot — both are reinserted server-side
/// from the dispatch scope, never carried on the wire.
#[derive(Debug, Clone)]
pub struct RemoteRequest {
    pub delegate: DelegateName,
    pub parameters: Vec<Value>,
}

impl RemoteRequest {
    pub fn new(delegate: impl Into<DelegateName>, parameters: Vec<Value>) -> Self {
        RemoteRequest { delegate: delegate.into(), parameters }
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "delegate": self.delegate.as_str(),
            "parameters": self.parameters,
        })
    }

    pub fn from_json(json: &Value) -> Result<Self, NeatooError> {
        let obj = json
            .as_object()
            .ok_or_else(|| NeatooError::BadRequest("request envelope must be a JSON object".into()))?;
        let delegate = obj
            .get("delegate")
            .and_then(Value::as_str)
            .ok_or_else(|| NeatooError::BadRequest("request envelope missing 'delegate'".into()))?;
        let parameters = obj
            .get("parameters")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(RemoteRequest { delegate: DelegateName::new(delegate), parameters })
    }
}

/// Exactly one of `Result`, `Error`, or `AuthorizationDenial` per §4.4.
#[derive(Debug, Clone)]
pub enum RemoteResponse {
    Result(Value),
    Error { kind: String, message: String },
    AuthorizationDenial(String),
}

impl RemoteResponse {
    pub fn from_error(err: NeatooError) -> Self {
        if let NeatooError::NotAuthorized(reason) = err {
            return RemoteResponse::AuthorizationDenial(reason);
        }
        RemoteResponse::Error { kind: err.kind().to_string(), message: err.message() }
    }

    pub fn to_json(&self) -> Value {
        match self {
            RemoteResponse::Result(value) => serde_json::json!({ "result": value }),
            RemoteResponse::Error { kind, message } => {
                serde_json::json!({ "error": { "kind": kind, "message": message } })
            }
            RemoteResponse::AuthorizationDenial(reason) => {
                serde_json::json!({ "authorizationDenial": reason })
            }
        }
    }

    pub fn from_json(json: &Value) -> Result<Self, NeatooError> {
        let obj = json
            .as_object()
            .ok_or_else(|| NeatooError::BadRequest("response envelope must be a JSON object".into()))?;

        if let Some(result) = obj.get("result") {
            return Ok(RemoteResponse::Result(result.clone()));
        }
        if let Some(reason) = obj.get("authorizationDenial").and_then(Value::as_str) {
            return Ok(RemoteResponse::AuthorizationDenial(reason.to_string()));
        }
        if let Some(err) = obj.get("error") {
            let kind = err
                .get("kind")
                .and_then(Value::as_str)
                .ok_or_else(|| NeatooError::BadRequest("error envelope missing 'kind'".into()))?;
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Ok(RemoteResponse::Error { kind: kind.to_string(), message });
        }
        Err(NeatooError::BadRequest(
            "response envelope carries none of result/error/authorizationDenial".into(),
        ))
    }

    /// Reconstruct the client-visible outcome per the §7 propagation policy.
    /// `NotAuthorized` and `Canceled` always raise; any other server error
    /// kind raises as `Domain` carrying the original message, except when
    /// the kind exactly matches a known taxonomy member (reconstructed
    /// faithfully so callers can match on it).
    pub fn into_result(self) -> Result<Value, NeatooError> {
        match self {
            RemoteResponse::Result(value) => Ok(value),
            RemoteResponse::AuthorizationDenial(reason) => Err(NeatooError::NotAuthorized(reason)),
            RemoteResponse::Error { kind, message } => Err(reconstruct_error(&kind, message)),
        }
    }
}

fn reconstruct_error(kind: &str, message: String) -> NeatooError {
    match kind {
        "BadRequest" => NeatooError::BadRequest(message),
        "UnknownDelegate" => NeatooError::UnknownDelegate(message),
        "SerializationMismatch" => NeatooError::SerializationMismatch(message),
        "MissingService" => NeatooError::MissingService(message),
        "NotAuthorized" => NeatooError::NotAuthorized(message),
        "Canceled" => NeatooError::Canceled,
        "SaveNotSupported" => NeatooError::SaveNotSupported(message),
        _ => NeatooError::Domain(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips_through_json() {
        let req = RemoteRequest::new("OrdersFactory.Fetch#int32", vec![serde_json::json!(7)]);
        let json = req.to_json();
        let back = RemoteRequest::from_json(&json).unwrap();
        assert_eq!(back.delegate.as_str(), "OrdersFactory.Fetch#int32");
        assert_eq!(back.parameters, vec![serde_json::json!(7)]);
    }

    #[test]
    fn result_round_trips() {
        let resp = RemoteResponse::Result(serde_json::json!([true, 42, "John"]));
        let json = resp.to_json();
        let back = RemoteResponse::from_json(&json).unwrap();
        assert_eq!(back.into_result().unwrap(), serde_json::json!([true, 42, "John"]));
    }

    #[test]
    fn authorization_denial_raises_not_authorized() {
        let resp = RemoteResponse::AuthorizationDenial("forbidden".into());
        let err = resp.into_result().unwrap_err();
        assert!(matches!(err, NeatooError::NotAuthorized(reason) if reason == "forbidden"));
    }

    #[test]
    fn error_kind_reconstructs_to_matching_variant() {
        let resp = RemoteResponse::Error { kind: "Canceled".into(), message: String::new() };
        let err = resp.into_result().unwrap_err();
        assert!(matches!(err, NeatooError::Canceled));
    }

    #[test]
    fn from_error_splits_not_authorized_into_denial() {
        let resp = RemoteResponse::from_error(NeatooError::NotAuthorized("nope".into()));
        assert!(matches!(resp, RemoteResponse::AuthorizationDenial(reason) if reason == "nope"));
    }
}
