use std::sync::Arc;

use neatoo_core::{FactoryOperation, NeatooError, OperationFlags, SaveMeta, ServiceScope};
use neatoo_events::EventScheduler;
use neatoo_factory::{run_save, AuthorizationPredicate, LifecycleHooks, RolesPredicate};
use neatoo_rpc::{DelegateRegistry, DispatchContext};
use serde_json::Value;

use crate::models::{Task, TaskEdit};
use crate::services::TaskStore;
use crate::state::DemoPrincipal;

/// Registers the `TaskFactory` delegates against `store`, wiring Update so
/// that flipping a task's `completed` flag enqueues a `TaskCompleted`
/// event through `events` once the save commits.
pub fn register(registry: &mut DelegateRegistry, store: TaskStore, events: Arc<EventScheduler>) {
    registry
        .register("TaskFactory.FetchAll", {
            let store = store.clone();
            Arc::new(move |_scope, _ctx, _args| {
                let store = store.clone();
                Box::pin(async move { Ok(serde_json::to_value(store.list().await).unwrap()) })
            })
        })
        .unwrap();

    registry
        .register("TaskFactory.Fetch#int64", {
            let store = store.clone();
            Arc::new(move |_scope, _ctx, args| {
                let store = store.clone();
                Box::pin(async move { fetch(&store, &args).await })
            })
        })
        .unwrap();

    registry
        .register("TaskFactory.Save", {
            let store = store.clone();
            let events = events.clone();
            Arc::new(move |scope, ctx, args| {
                let store = store.clone();
                let events = events.clone();
                Box::pin(async move { save(&store, &events, scope, ctx, args).await })
            })
        })
        .unwrap();
}

async fn fetch(store: &TaskStore, args: &[Value]) -> Result<Value, NeatooError> {
    let id = args
        .first()
        .and_then(Value::as_u64)
        .ok_or_else(|| NeatooError::BadRequest("Fetch expects a single int64 id".into()))?;
    match store.get(id).await {
        Some(task) => Ok(serde_json::to_value(task).unwrap()),
        None => Err(NeatooError::Domain(format!("no task with id {id}"))),
    }
}

/// The only mutating entry point: decodes a [`TaskEdit`], routes it through
/// `run_save` per §4.7/§4.8, and on a completed update fires the event.
async fn save(
    store: &TaskStore,
    events: &EventScheduler,
    _scope: Arc<ServiceScope>,
    ctx: DispatchContext,
    args: Vec<Value>,
) -> Result<Value, NeatooError> {
    let (edit, principal_roles) = decode_save_args(&args)?;
    let principal = DemoPrincipal::from_roles(&principal_roles);

    let delete_requires_admin: Box<dyn AuthorizationPredicate<TaskEdit>> =
        Box::new(RolesPredicate::new(OperationFlags::DELETE, vec!["admin".into()]));

    let hooks = LifecycleHooks::default();
    let store_for_method = store.clone();

    let outcome = run_save(
        edit,
        |operation| matches!(operation, FactoryOperation::Insert | FactoryOperation::Update | FactoryOperation::Delete),
        Some(&principal),
        &[delete_requires_admin],
        &[],
        &hooks,
        ctx.cancellation.clone(),
        Box::new(move |edit, _cancellation| {
            Box::pin(async move { apply(&store_for_method, edit).await })
        }),
    )
    .await?;

    match outcome {
        neatoo_core::Authorized::Granted(edit) => {
            if edit.completed {
                if let Some(id) = edit.id {
                    events.enqueue("TaskCompleted", vec![serde_json::json!({ "task_id": id, "title": edit.title })]);
                }
            }
            Ok(serde_json::json!({ "id": edit.id, "title": edit.title, "completed": edit.completed }))
        }
        neatoo_core::Authorized::Denied(reason) => Err(NeatooError::NotAuthorized(reason)),
    }
}

async fn apply(store: &TaskStore, edit: TaskEdit) -> Result<TaskEdit, (TaskEdit, NeatooError)> {
    if edit.is_deleted() {
        let Some(id) = edit.id else {
            return Err((edit, NeatooError::BadRequest("delete requires an id".into())));
        };
        store.delete(id).await;
        return Ok(edit);
    }

    let task: Task = if let Some(id) = edit.id {
        match store.update(id, edit.title.clone(), edit.completed).await {
            Some(task) => task,
            None => return Err((edit, NeatooError::Domain(format!("no task with id {id}")))),
        }
    } else {
        store.insert(edit.title.clone(), edit.completed).await
    };

    Ok(TaskEdit { id: Some(task.id), title: task.title, completed: task.completed, deleted: false })
}

/// `parameters[0]` is the `TaskEdit`, `parameters[1]` (optional) is the
/// caller's roles — the demo's stand-in for a real authentication layer.
fn decode_save_args(args: &[Value]) -> Result<(TaskEdit, Value), NeatooError> {
    let edit = args
        .first()
        .ok_or_else(|| NeatooError::BadRequest("Save expects a TaskEdit argument".into()))?;
    let edit: TaskEdit = serde_json::from_value(edit.clone())
        .map_err(|e| NeatooError::SerializationMismatch(e.to_string()))?;
    let roles = args.get(1).cloned().unwrap_or(Value::Array(vec![]));
    Ok((edit, roles))
}
