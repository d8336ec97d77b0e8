//! Axum hosting for the neatoo dispatcher: a single POST route plus the
//! supplemented `/health` endpoint (§6, SPEC_FULL.md §C.1).

pub mod dispatch;
pub mod health;
pub mod state;

pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

/// Assemble the dispatcher's router: `POST /api/neatoo` plus `GET /health`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/neatoo", post(dispatch::dispatch))
        .route("/health", get(health::health))
        .with_state(state)
}

/// Bind and serve until a shutdown signal arrives, then drive the linked
/// `CancellationToken` in `state.shutdown` so in-flight work observes it —
/// mirrors the teacher's `AppBuilder::serve` graceful-shutdown sequence.
pub async fn serve(state: AppState, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = state.shutdown.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "neatoo dispatcher listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("neatoo dispatcher stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: tokio_util::sync::CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to listen for Ctrl-C");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, starting graceful shutdown");
    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use neatoo_core::{NeatooConfig, ServiceRegistry};
    use neatoo_rpc::DelegateRegistry;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let mut delegates = DelegateRegistry::new();
        delegates
            .register(
                "Echo",
                Arc::new(|_scope, _ctx, args| {
                    Box::pin(async move { Ok(serde_json::Value::Array(args)) })
                }),
            )
            .unwrap();
        AppState::new(delegates, NeatooConfig::empty(), ServiceRegistry::new, CancellationToken::new())
    }

    #[tokio::test]
    async fn health_reports_delegate_count() {
        let app = router(test_state());
        let req = axum::http::Request::builder()
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), axum::http::StatusCode::OK);
    }
}
