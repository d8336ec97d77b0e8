//! `GET /health` — reports liveness plus two counts an operator cares
//! about for this kind of host: registered delegates and events still
//! draining. Adapted from the aggregated-status shape of a conventional
//! health endpoint, trimmed to the two signals this runtime actually has.

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub registered_delegates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_events: Option<usize>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP",
        registered_delegates: state.delegates.len(),
        pending_events: state.events.as_ref().map(|events| events.pending_count()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use neatoo_core::{NeatooConfig, ServiceRegistry};
    use neatoo_events::EventScheduler;
    use neatoo_rpc::DelegateRegistry;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn omits_pending_events_without_a_scheduler() {
        let state = AppState::new(DelegateRegistry::new(), NeatooConfig::empty(), ServiceRegistry::new, CancellationToken::new());
        let response = health(State(state)).await;
        assert_eq!(response.0.pending_events, None);
    }

    #[tokio::test]
    async fn reports_pending_events_with_a_scheduler() {
        let scheduler = EventScheduler::new(DelegateRegistry::new(), ServiceRegistry::new, CancellationToken::new());
        let state = AppState::new(DelegateRegistry::new(), NeatooConfig::empty(), ServiceRegistry::new, CancellationToken::new())
            .with_events(scheduler);
        let response = health(State(state)).await;
        assert_eq!(response.0.pending_events, Some(0));
    }
}
