//! Authorization Chain (C8): class-level and method-level predicates
//! evaluated left-to-right and AND'd into a single [`Authorized`] outcome —
//! §4.8.

use futures_util::future::BoxFuture;
use neatoo_core::{Authorized, FactoryOperation, OperationFlags};

/// Ambient identity consulted by predicates that check roles or ownership.
/// Kept minimal — a stand-in for whatever identity type the host
/// application hangs off its request context.
pub trait Principal: Send + Sync {
    fn roles(&self) -> &[String];
}

/// Everything a predicate needs to decide: the entity being acted on, the
/// operation being attempted, and the caller's identity, if any.
pub struct AuthorizationContext<'a, T> {
    pub entity: &'a T,
    pub operation: FactoryOperation,
    pub principal: Option<&'a dyn Principal>,
}

/// One authorization check, tagged with the capability flags it governs.
/// A predicate only runs for operations whose flags intersect its own.
pub trait AuthorizationPredicate<T>: Send + Sync {
    fn flags(&self) -> OperationFlags;

    fn check<'a>(&'a self, ctx: &'a AuthorizationContext<'a, T>) -> BoxFuture<'a, Authorized<()>>;
}

/// Evaluate class-level predicates, then method-level predicates, against
/// `operation`. Short-circuits on the first denial; all others must grant
/// for the chain to grant (AND semantics, never OR across predicates).
pub async fn evaluate<T>(
    entity: &T,
    operation: FactoryOperation,
    principal: Option<&dyn Principal>,
    class_predicates: &[Box<dyn AuthorizationPredicate<T>>],
    method_predicates: &[Box<dyn AuthorizationPredicate<T>>],
) -> Authorized<()> {
    let flags = operation.flags();
    if flags.is_empty() {
        // Event/None operations never enter the authorization chain.
        return Authorized::granted(());
    }

    let ctx = AuthorizationContext { entity, operation, principal };

    for predicate in class_predicates.iter().chain(method_predicates.iter()) {
        if !predicate.flags().intersects(flags) {
            continue;
        }
        if let Authorized::Denied(reason) = predicate.check(&ctx).await {
            return Authorized::Denied(reason);
        }
    }

    Authorized::granted(())
}

/// Built-in class-level predicate requiring the principal to carry at
/// least one of a fixed set of roles for the operations it's tagged with.
/// Ready-made demonstration of "a record of function values keyed by a
/// flag set" for hosts with no attribute-driven metaprogramming.
pub struct RolesPredicate<T> {
    flags: OperationFlags,
    required_roles: Vec<String>,
    _entity: std::marker::PhantomData<fn(&T)>,
}

impl<T> RolesPredicate<T> {
    pub fn new(flags: OperationFlags, required_roles: Vec<String>) -> Self {
        RolesPredicate { flags, required_roles, _entity: std::marker::PhantomData }
    }
}

impl<T: Send + Sync> AuthorizationPredicate<T> for RolesPredicate<T> {
    fn flags(&self) -> OperationFlags {
        self.flags
    }

    fn check<'a>(&'a self, ctx: &'a AuthorizationContext<'a, T>) -> BoxFuture<'a, Authorized<()>> {
        Box::pin(async move {
            let Some(principal) = ctx.principal else {
                return Authorized::denied("no principal available for role check");
            };
            let roles = principal.roles();
            let has_role = self.required_roles.iter().any(|required| roles.iter().any(|r| r == required));
            if has_role {
                Authorized::granted(())
            } else {
                Authorized::denied("insufficient roles")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entity;

    struct Caller(Vec<String>);

    impl Principal for Caller {
        fn roles(&self) -> &[String] {
            &self.0
        }
    }

    #[tokio::test]
    async fn roles_predicate_grants_when_role_present() {
        let predicate: Box<dyn AuthorizationPredicate<Entity>> =
            Box::new(RolesPredicate::new(OperationFlags::WRITE, vec!["admin".into()]));
        let caller = Caller(vec!["admin".into()]);
        let outcome = evaluate(&Entity, FactoryOperation::Update, Some(&caller), &[predicate], &[]).await;
        assert!(outcome.has_access());
    }

    #[tokio::test]
    async fn roles_predicate_denies_without_role() {
        let predicate: Box<dyn AuthorizationPredicate<Entity>> =
            Box::new(RolesPredicate::new(OperationFlags::WRITE, vec!["admin".into()]));
        let caller = Caller(vec!["viewer".into()]);
        let outcome = evaluate(&Entity, FactoryOperation::Update, Some(&caller), &[predicate], &[]).await;
        assert!(!outcome.has_access());
    }

    #[tokio::test]
    async fn predicate_skipped_when_flags_dont_overlap() {
        let predicate: Box<dyn AuthorizationPredicate<Entity>> =
            Box::new(RolesPredicate::new(OperationFlags::DELETE, vec!["admin".into()]));
        let caller = Caller(vec![]);
        let outcome = evaluate(&Entity, FactoryOperation::Fetch, Some(&caller), &[predicate], &[]).await;
        assert!(outcome.has_access());
    }

    #[tokio::test]
    async fn event_operation_skips_the_chain_entirely() {
        let predicate: Box<dyn AuthorizationPredicate<Entity>> =
            Box::new(RolesPredicate::new(OperationFlags::all(), vec!["admin".into()]));
        let outcome = evaluate(&Entity, FactoryOperation::Event, None, &[predicate], &[]).await;
        assert!(outcome.has_access());
    }
}
