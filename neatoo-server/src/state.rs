//! Shared dispatcher state: the populated delegate registry, ambient
//! config, and a per-request service-scope factory.
//!
//! `scope_factory` stands in for the "dependency-injection container" the
//! core treats as an external collaborator (§1 Non-goals) — the
//! application supplies a closure that builds a fresh
//! `neatoo_core::ServiceRegistry` for every request, since
//! `ServiceRegistry::resolve` consumes the registry it resolves.

use std::sync::Arc;

use neatoo_core::{NeatooConfig, ServiceRegistry};
use neatoo_events::EventScheduler;
use neatoo_rpc::DelegateRegistry;
use tokio_util::sync::CancellationToken;

type ScopeFactory = Arc<dyn Fn() -> ServiceRegistry + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub delegates: Arc<DelegateRegistry>,
    pub config: Arc<NeatooConfig>,
    pub scope_factory: ScopeFactory,
    pub shutdown: CancellationToken,
    /// Absent for hosts that register no events — `/health` then omits the
    /// pending-events count instead of reporting a meaningless zero.
    pub events: Option<Arc<EventScheduler>>,
}

impl AppState {
    pub fn new(
        delegates: DelegateRegistry,
        config: NeatooConfig,
        scope_factory: impl Fn() -> ServiceRegistry + Send + Sync + 'static,
        shutdown: CancellationToken,
    ) -> Self {
        AppState {
            delegates: Arc::new(delegates),
            config: Arc::new(config),
            scope_factory: Arc::new(scope_factory),
            shutdown,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventScheduler) -> Self {
        self.events = Some(Arc::new(events));
        self
    }
}
