//! Client Proxy (C6): posts a [`RemoteRequest`] to the dispatcher endpoint,
//! carries the ambient correlation id, adopts the server's declared wire
//! format, and decodes the response per the §4.6/§7 propagation policy.

use std::sync::{Arc, RwLock};

use futures_util::future::BoxFuture;
use neatoo_core::{Authorized, CorrelationId, DelegateName, NeatooError, WireFormat};
use neatoo_rpc::{RemoteRequest, RemoteResponse, CORRELATION_HEADER, FORMAT_HEADER};
use serde_json::Value;

/// A thin HTTP stub over one dispatcher endpoint. Cheap to clone — the
/// underlying `reqwest::Client` pools connections internally.
#[derive(Clone)]
pub struct NeatooClient {
    http: reqwest::Client,
    endpoint: String,
    format: Arc<RwLock<WireFormat>>,
}

impl NeatooClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        NeatooClient {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            format: Arc::new(RwLock::new(WireFormat::Named)),
        }
    }

    /// The wire format last adopted from the server's response header.
    pub fn format(&self) -> WireFormat {
        *self.format.read().expect("format lock poisoned")
    }

    /// Invoke a delegate, raising on `AuthorizationDenial` and on any
    /// server-side error — the propagation policy for non-`TryX` methods.
    pub async fn invoke(&self, delegate: impl Into<DelegateName>, parameters: Vec<Value>) -> Result<Value, NeatooError> {
        self.send(delegate.into(), parameters).await?.into_result()
    }

    /// Invoke a delegate the way a `TryX` method would: an authorization
    /// denial comes back as `Authorized::Denied` instead of raising.
    pub async fn try_invoke(
        &self,
        delegate: impl Into<DelegateName>,
        parameters: Vec<Value>,
    ) -> Result<Authorized<Value>, NeatooError> {
        match self.send(delegate.into(), parameters).await? {
            RemoteResponse::Result(value) => Ok(Authorized::Granted(value)),
            RemoteResponse::AuthorizationDenial(reason) => Ok(Authorized::Denied(reason)),
            resp @ RemoteResponse::Error { .. } => Err(resp.into_result().unwrap_err()),
        }
    }

    /// Build a stub closure for a fixed delegate — "a thin closure over the
    /// proxy" per §4.3.
    pub fn stub(&self, delegate: impl Into<DelegateName>) -> impl Fn(Vec<Value>) -> BoxFuture<'static, Result<Value, NeatooError>> {
        let client = self.clone();
        let delegate = delegate.into();
        move |parameters| {
            let client = client.clone();
            let delegate = delegate.clone();
            Box::pin(async move { client.invoke(delegate, parameters).await })
        }
    }

    async fn send(&self, delegate: DelegateName, parameters: Vec<Value>) -> Result<RemoteResponse, NeatooError> {
        let id = CorrelationId::ensure();
        id.clone().scope(self.send_with_id(delegate, parameters, id)).await
    }

    async fn send_with_id(
        &self,
        delegate: DelegateName,
        parameters: Vec<Value>,
        id: CorrelationId,
    ) -> Result<RemoteResponse, NeatooError> {
        let request = RemoteRequest::new(delegate, parameters);

        let response = self
            .http
            .post(&self.endpoint)
            .header(CORRELATION_HEADER, id.as_str())
            .json(&request.to_json())
            .send()
            .await
            .map_err(|e| NeatooError::Domain(format!("neatoo endpoint unreachable: {e}")))?;

        if let Some(format) = response
            .headers()
            .get(FORMAT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<WireFormat>().ok())
        {
            *self.format.write().expect("format lock poisoned") = format;
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| NeatooError::SerializationMismatch(format!("invalid response envelope: {e}")))?;

        RemoteResponse::from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_defaults_to_named_format() {
        let client = NeatooClient::new("http://localhost:8080/api/neatoo");
        assert!(matches!(client.format(), WireFormat::Named));
    }
}
