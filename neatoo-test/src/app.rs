//! `TestApp`: drives the dispatcher's `Router` in-process with
//! `tower::ServiceExt::oneshot`, without binding a TCP socket. No
//! Bearer-token helpers here — the remote-factory protocol has no
//! auth-header layer of its own, only the `AuthorizationDenial` the
//! envelope already carries.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bytes::Bytes;
use http_body_util::BodyExt;
use neatoo_core::{DelegateName, NeatooError};
use neatoo_rpc::RemoteResponse;
use neatoo_server::AppState;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::util::ServiceExt;

pub struct TestApp {
    router: axum::Router,
}

impl TestApp {
    pub fn new(state: AppState) -> Self {
        TestApp { router: neatoo_server::router(state) }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("failed to read response body")
            .to_bytes();
        TestResponse { status, body }
    }

    pub async fn get_health(&self) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Drive one delegate invocation through the real dispatcher, the way
    /// a `neatoo-client` stub would over the wire.
    pub async fn invoke(&self, delegate: impl Into<DelegateName>, parameters: Vec<Value>) -> TestResponse {
        let delegate = delegate.into();
        let body = serde_json::json!({ "delegate": delegate.as_str(), "parameters": parameters }).to_string();
        let request = Request::builder()
            .method("POST")
            .uri("/api/neatoo")
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

/// Response wrapper with assertion helpers.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl TestResponse {
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(self.status, expected, "expected {expected}, got {}: {}", self.status, self.text());
        self
    }

    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_bad_request(self) -> Self {
        self.assert_status(StatusCode::BAD_REQUEST)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("failed to parse JSON: {e}\nbody: {}", self.text()))
    }

    /// Decode the body as a response envelope.
    pub fn envelope(&self) -> RemoteResponse {
        RemoteResponse::from_json(&self.json::<Value>()).expect("malformed response envelope")
    }

    /// Unwrap the envelope per the §7 propagation policy: the delegate's
    /// result on success, the reconstructed error on denial or failure.
    pub fn into_result(self) -> Result<Value, NeatooError> {
        self.envelope().into_result()
    }
}
