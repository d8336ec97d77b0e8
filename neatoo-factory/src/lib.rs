//! Per-entity orchestration: the Factory Core state machine and the
//! Authorization Chain it runs before every user method — §4.7, §4.8.

pub mod authz;
pub mod core;

pub use authz::{AuthorizationContext, AuthorizationPredicate, Principal, RolesPredicate};
pub use core::{run, run_save, save_operation, LifecycleHooks, UserMethodResult};
