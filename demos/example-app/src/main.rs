use std::sync::Arc;

use neatoo_core::{NeatooConfig, ServiceRegistry};
use neatoo_rpc::DelegateRegistry;
use neatoo_server::AppState;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod delegates;
mod models;
mod services;
mod state;

use services::TaskStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let shutdown = CancellationToken::new();
    let store = TaskStore::new();

    let mut event_handlers = DelegateRegistry::new();
    event_handlers
        .register("TaskCompleted", Arc::new(|_scope, _ctx, args| {
            Box::pin(async move {
                if let Some(payload) = args.first() {
                    info!(%payload, "task completed");
                }
                Ok(serde_json::Value::Null)
            })
        }))
        .unwrap();

    let events = Arc::new(neatoo_events::EventScheduler::new(event_handlers, ServiceRegistry::new, shutdown.clone()));

    let mut delegates = DelegateRegistry::new();
    delegates::register(&mut delegates, store, events.clone());

    let state = AppState::new(delegates, NeatooConfig::empty(), ServiceRegistry::new, shutdown).with_events((*events).clone());

    info!("starting neatoo task-factory demo on 0.0.0.0:3000");
    neatoo_server::serve(state, "0.0.0.0:3000").await.unwrap();
}
