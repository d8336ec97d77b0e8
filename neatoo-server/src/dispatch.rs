//! The Server Dispatcher (C5): the single `/api/neatoo` handler that
//! parses a request envelope, resolves and invokes a delegate, and
//! encodes the response — §4.5.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use neatoo_core::{CorrelationId, NeatooError};
use neatoo_rpc::{DispatchContext, RemoteRequest, RemoteResponse, CORRELATION_HEADER, FORMAT_HEADER};
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// Cancels `token` when dropped. Lives on the handler's own stack so that
/// hyper dropping a disconnected client's service future also cancels any
/// work the delegate handler spawned off and retained a clone of the
/// linked token for.
struct CancelOnDrop(CancellationToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

pub async fn dispatch(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let correlation_id = extract_correlation_id(&headers);
    let format_header = state.config.default_format().as_header_value();

    let response = correlation_id
        .clone()
        .scope(handle(state, correlation_id.clone(), body))
        .await;

    let (status, body) = encode(&response);
    let mut http_response = (status, body).into_response();
    let headers = http_response.headers_mut();
    headers.insert(FORMAT_HEADER, HeaderValue::from_static(format_header));
    if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
        headers.insert(CORRELATION_HEADER, value);
    }
    http_response
}

fn extract_correlation_id(headers: &HeaderMap) -> CorrelationId {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(CorrelationId::from)
        .unwrap_or_else(CorrelationId::generate)
}

async fn handle(state: AppState, correlation_id: CorrelationId, body: Bytes) -> RemoteResponse {
    let json: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return RemoteResponse::from_error(NeatooError::BadRequest(e.to_string())),
    };
    let request = match RemoteRequest::from_json(&json) {
        Ok(r) => r,
        Err(e) => return RemoteResponse::from_error(e),
    };

    let linked = state.shutdown.child_token();
    let _guard = CancelOnDrop(linked.clone());
    let ctx = DispatchContext::new(correlation_id, linked);

    let scope = match (state.scope_factory)().resolve().await {
        Ok(scope) => Arc::new(scope),
        Err(e) => return RemoteResponse::from_error(NeatooError::MissingService(e.to_string())),
    };

    match state
        .delegates
        .invoke(&request.delegate, scope, ctx, request.parameters)
        .await
    {
        Ok(value) => RemoteResponse::Result(value),
        Err(e) => RemoteResponse::from_error(e),
    }
}

/// Parse failures before a delegate could even be looked up get a 400;
/// every other outcome — including an unknown delegate or a denied
/// authorization check — is carried inside a 200-status envelope body,
/// per the RPC convention of §4.5 step 1.
fn encode(response: &RemoteResponse) -> (StatusCode, String) {
    let status = match response {
        RemoteResponse::Error { kind, .. } if kind == "BadRequest" => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };
    (status, response.to_json().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neatoo_core::ServiceRegistry;
    use neatoo_rpc::DelegateRegistry;
    use std::sync::Arc as StdArc;

    fn test_state() -> AppState {
        let mut delegates = DelegateRegistry::new();
        delegates
            .register(
                "Echo",
                StdArc::new(|_scope, _ctx, args| {
                    Box::pin(async move { Ok(serde_json::Value::Array(args)) })
                }),
            )
            .unwrap();
        AppState::new(
            delegates,
            neatoo_core::NeatooConfig::empty(),
            ServiceRegistry::new,
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn bad_json_maps_to_bad_request() {
        let state = test_state();
        let resp = handle(state, CorrelationId::generate(), Bytes::from_static(b"not json")).await;
        let (status, _) = encode(&resp);
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn known_delegate_returns_result() {
        let state = test_state();
        let body = serde_json::json!({"delegate": "Echo", "parameters": [1, 2]}).to_string();
        let resp = handle(state, CorrelationId::generate(), Bytes::from(body)).await;
        assert!(matches!(resp, RemoteResponse::Result(_)));
    }

    #[tokio::test]
    async fn unknown_delegate_is_an_error_envelope_not_a_400() {
        let state = test_state();
        let body = serde_json::json!({"delegate": "Missing", "parameters": []}).to_string();
        let resp = handle(state, CorrelationId::generate(), Bytes::from(body)).await;
        let (status, _) = encode(&resp);
        assert_eq!(status, StatusCode::OK);
        assert!(matches!(resp, RemoteResponse::Error { ref kind, .. } if kind == "UnknownDelegate"));
    }
}
