//! Event Scheduler (C9): fire-and-forget work run in strict isolation from
//! the caller's scope — §4.9.
//!
//! Each enqueued event opens its own resolver scope, runs against a
//! cancellation token bound to application shutdown rather than the
//! caller's, and swallows (logs, never raises) any handler failure. A
//! [`tokio_util::task::TaskTracker`] stands in for the "thread-safe bag" of
//! pending tasks the contract calls for — it already does opportunistic
//! cleanup and exposes the wait-with-timeout drain the shutdown coordinator
//! needs.

use std::sync::Arc;
use std::time::Duration;

use neatoo_core::{CorrelationId, DelegateName, ServiceRegistry};
use neatoo_rpc::{DelegateRegistry, DispatchContext};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, warn};

type ScopeFactory = Arc<dyn Fn() -> ServiceRegistry + Send + Sync>;

/// Schedules and tracks fire-and-forget event handlers.
#[derive(Clone)]
pub struct EventScheduler {
    handlers: Arc<DelegateRegistry>,
    scope_factory: ScopeFactory,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl EventScheduler {
    pub fn new(
        handlers: DelegateRegistry,
        scope_factory: impl Fn() -> ServiceRegistry + Send + Sync + 'static,
        shutdown: CancellationToken,
    ) -> Self {
        EventScheduler {
            handlers: Arc::new(handlers),
            scope_factory: Arc::new(scope_factory),
            shutdown,
            tracker: TaskTracker::new(),
        }
    }

    /// Enqueue `name` against `args`. Returns a handle the caller may
    /// discard or await; it resolves once the worker completes, whether
    /// the handler succeeded, failed, or panicked — the original failure
    /// never reaches the caller, only the log.
    pub fn enqueue(&self, name: impl Into<DelegateName>, args: Vec<Value>) -> tokio::task::JoinHandle<()> {
        let name = name.into();
        let handlers = self.handlers.clone();
        let scope_factory = self.scope_factory.clone();
        let cancellation = self.shutdown.child_token();
        let correlation_id = CorrelationId::ensure();

        self.tracker.spawn(correlation_id.clone().scope(async move {
            let scope = match (scope_factory)().resolve().await {
                Ok(scope) => Arc::new(scope),
                Err(err) => {
                    error!(event = %name, error = %err, "event scope resolution failed, handler not invoked");
                    return;
                }
            };

            let ctx = DispatchContext::new(correlation_id, cancellation);
            if let Err(err) = handlers.invoke(&name, scope, ctx, args).await {
                error!(event = %name, error = %err, "event handler failed, swallowing");
            }
        }))
    }

    /// Wait for all pending events to finish, up to `timeout`. Pending
    /// tasks past the deadline are logged and left running — shutdown is
    /// never blocked further.
    pub async fn drain(&self, timeout: Duration) {
        self.tracker.close();
        if tokio::time::timeout(timeout, self.tracker.wait()).await.is_err() {
            warn!(pending = self.tracker.len(), "event drain timed out, abandoning pending tasks");
        }
    }

    /// Tasks spawned but not yet completed.
    pub fn pending_count(&self) -> usize {
        self.tracker.len()
    }
}
