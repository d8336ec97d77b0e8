//! Factory Core (C7): the per-operation state machine — authorize, run
//! lifecycle hooks, invoke the user method, run the matching completion or
//! cancellation hook — §4.7.

use futures_util::future::BoxFuture;
use neatoo_core::{save_route, Authorized, FactoryOperation, NeatooError, SaveMeta, SaveRoute};
use tokio_util::sync::CancellationToken;

use crate::authz::{self, AuthorizationPredicate, Principal};

type SyncHook<T> = Box<dyn Fn(T) -> Result<T, NeatooError> + Send + Sync>;
type AsyncHook<T> = Box<dyn Fn(T) -> BoxFuture<'static, Result<T, NeatooError>> + Send + Sync>;
type CancelHook<T> = Box<dyn Fn(T) -> BoxFuture<'static, T> + Send + Sync>;

/// The lifecycle hooks a delegate may register around its user method.
/// Start and Complete each run a sync hook, then an async hook, mirroring
/// the two-phase wording of the state diagram; Cancelled is cleanup-only
/// and never fails the operation.
#[derive(Default)]
pub struct LifecycleHooks<T> {
    pub on_start_sync: Option<SyncHook<T>>,
    pub on_start_async: Option<AsyncHook<T>>,
    pub on_complete_sync: Option<SyncHook<T>>,
    pub on_complete_async: Option<AsyncHook<T>>,
    pub on_cancelled: Option<CancelHook<T>>,
}

/// The user method's outcome. On `Err`, the entity is handed back
/// alongside the error so the Cancelled hook can still run cleanup on it.
pub type UserMethodResult<T> = Result<T, (T, NeatooError)>;

type UserMethod<T> = Box<dyn FnOnce(T, CancellationToken) -> BoxFuture<'static, UserMethodResult<T>> + Send>;

/// Run a single factory operation through the full state machine: authorize,
/// Start hooks, user method, then the Complete or Cancelled hook that
/// matches the outcome.
pub async fn run<T>(
    entity: T,
    operation: FactoryOperation,
    principal: Option<&dyn Principal>,
    class_predicates: &[Box<dyn AuthorizationPredicate<T>>],
    method_predicates: &[Box<dyn AuthorizationPredicate<T>>],
    hooks: &LifecycleHooks<T>,
    cancellation: CancellationToken,
    user_method: UserMethod<T>,
) -> Result<Authorized<T>, NeatooError>
where
    T: Send + Sync + 'static,
{
    if let Authorized::Denied(reason) =
        authz::evaluate(&entity, operation, principal, class_predicates, method_predicates).await
    {
        return Ok(Authorized::Denied(reason));
    }

    let mut entity = entity;
    if let Some(hook) = &hooks.on_start_sync {
        entity = hook(entity)?;
    }
    if let Some(hook) = &hooks.on_start_async {
        entity = hook(entity).await?;
    }

    match user_method(entity, cancellation).await {
        Ok(mut entity) => {
            if let Some(hook) = &hooks.on_complete_sync {
                entity = hook(entity)?;
            }
            if let Some(hook) = &hooks.on_complete_async {
                entity = hook(entity).await?;
            }
            Ok(Authorized::Granted(entity))
        }
        Err((entity, NeatooError::Canceled)) => {
            run_cancelled(entity, hooks).await;
            Err(NeatooError::Canceled)
        }
        // Any other thrown error surfaces as-is; Complete is never called.
        Err((_entity, other)) => Err(other),
    }
}

async fn run_cancelled<T>(entity: T, hooks: &LifecycleHooks<T>) {
    if let Some(hook) = &hooks.on_cancelled {
        hook(entity).await;
    }
}

/// The registered Save operation for a routing decision, or `None` for the
/// no-op (`IsNew && IsDeleted`) case.
pub fn save_operation(route: SaveRoute) -> Option<FactoryOperation> {
    match route {
        SaveRoute::Insert => Some(FactoryOperation::Insert),
        SaveRoute::Update => Some(FactoryOperation::Update),
        SaveRoute::Delete => Some(FactoryOperation::Delete),
        SaveRoute::NoOp => None,
    }
}

/// Save-routing entry point: inspects `IsNew`/`IsDeleted` to pick
/// Insert/Update/Delete, fails with `SaveNotSupported` if no method is
/// registered for that route, and short-circuits the no-op case before
/// authorization or any hook runs.
pub async fn run_save<T>(
    entity: T,
    supports: impl Fn(FactoryOperation) -> bool,
    principal: Option<&dyn Principal>,
    class_predicates: &[Box<dyn AuthorizationPredicate<T>>],
    method_predicates: &[Box<dyn AuthorizationPredicate<T>>],
    hooks: &LifecycleHooks<T>,
    cancellation: CancellationToken,
    user_method: UserMethod<T>,
) -> Result<Authorized<T>, NeatooError>
where
    T: SaveMeta + Send + Sync + 'static,
{
    let route = save_route(&entity);
    let Some(operation) = save_operation(route) else {
        return Ok(Authorized::Granted(entity));
    };
    if !supports(operation) {
        return Err(NeatooError::SaveNotSupported(operation.to_string()));
    }
    run(entity, operation, principal, class_predicates, method_predicates, hooks, cancellation, user_method).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Counter {
        value: i32,
        new: bool,
        deleted: bool,
        started: bool,
        completed: bool,
    }

    impl SaveMeta for Counter {
        fn is_new(&self) -> bool {
            self.new
        }
        fn is_deleted(&self) -> bool {
            self.deleted
        }
    }

    fn ok_method(add: i32) -> UserMethod<Counter> {
        Box::new(move |mut c, _token| {
            Box::pin(async move {
                c.value += add;
                Ok(c)
            })
        })
    }

    #[tokio::test]
    async fn granted_operation_runs_start_and_complete_hooks() {
        let entity = Counter { value: 0, new: false, deleted: false, started: false, completed: false };
        let hooks = LifecycleHooks {
            on_start_sync: Some(Box::new(|mut c: Counter| {
                c.started = true;
                Ok(c)
            })),
            on_complete_sync: Some(Box::new(|mut c: Counter| {
                c.completed = true;
                Ok(c)
            })),
            ..Default::default()
        };

        let outcome = run(
            entity,
            FactoryOperation::Update,
            None,
            &[],
            &[],
            &hooks,
            CancellationToken::new(),
            ok_method(5),
        )
        .await
        .unwrap();

        let Authorized::Granted(entity) = outcome else { panic!("expected granted") };
        assert_eq!(entity.value, 5);
        assert!(entity.started && entity.completed);
    }

    #[tokio::test]
    async fn cancellation_runs_cancelled_hook_not_complete() {
        let entity = Counter { value: 0, new: false, deleted: false, started: false, completed: false };
        let hooks = LifecycleHooks {
            on_complete_sync: Some(Box::new(|mut c: Counter| {
                c.completed = true;
                Ok(c)
            })),
            on_cancelled: Some(Box::new(|mut c: Counter| {
                Box::pin(async move {
                    c.value = -1;
                    c
                })
            })),
            ..Default::default()
        };
        let method: UserMethod<Counter> = Box::new(|c, _token| Box::pin(async move { Err((c, NeatooError::Canceled)) }));

        let err = run(entity, FactoryOperation::Update, None, &[], &[], &hooks, CancellationToken::new(), method)
            .await
            .unwrap_err();

        assert!(matches!(err, NeatooError::Canceled));
    }

    #[tokio::test]
    async fn no_op_save_skips_authorization_and_hooks() {
        let entity = Counter { value: 0, new: true, deleted: true, started: false, completed: false };
        let hooks = LifecycleHooks {
            on_start_sync: Some(Box::new(|_: Counter| panic!("start hook must not run"))),
            ..Default::default()
        };

        let outcome = run_save(entity, |_| true, None, &[], &[], &hooks, CancellationToken::new(), ok_method(1))
            .await
            .unwrap();

        assert!(matches!(outcome, Authorized::Granted(_)));
    }

    #[tokio::test]
    async fn save_with_no_registered_method_fails_not_supported() {
        let entity = Counter { value: 0, new: true, deleted: false, started: false, completed: false };
        let hooks = LifecycleHooks::default();

        let err = run_save(entity, |_| false, None, &[], &[], &hooks, CancellationToken::new(), ok_method(1))
            .await
            .unwrap_err();

        assert!(matches!(err, NeatooError::SaveNotSupported(_)));
    }
}
