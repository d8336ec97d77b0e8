//! The Delegate Registry (C3): maps stable [`DelegateName`]s to invokable
//! server-side handlers.
//!
//! Grounded on the same write-once registration discipline as
//! `neatoo_core::resolver::ServiceRegistry` and `neatoo_serde::TypeRegistry`
//! (duplicate-name detection, no locking needed once populated), keyed by
//! `DelegateName` instead of `TypeId` because the wire carries an opaque
//! delegate name, not a Rust type.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use neatoo_core::{DelegateName, NeatooError, ServiceScope};
use serde_json::Value;

use crate::context::DispatchContext;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, NeatooError>> + Send>>;

/// `(resolver, ctx, args[]) -> Task<value>` from §4.3, expressed as a boxed
/// closure so handlers of different concrete argument shapes share one
/// registry entry type.
pub type DelegateHandler =
    Arc<dyn Fn(Arc<ServiceScope>, DispatchContext, Vec<Value>) -> HandlerFuture + Send + Sync>;

#[derive(Debug)]
pub enum DelegateRegistryError {
    DuplicateDelegate(DelegateName),
}

impl std::fmt::Display for DelegateRegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelegateRegistryError::DuplicateDelegate(name) => {
                write!(f, "delegate '{name}' registered twice")
            }
        }
    }
}

impl std::error::Error for DelegateRegistryError {}

/// Write-once, read-many map from [`DelegateName`] to [`DelegateHandler`].
#[derive(Default, Clone)]
pub struct DelegateRegistry {
    handlers: HashMap<DelegateName, DelegateHandler>,
}

impl DelegateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<DelegateName>,
        handler: DelegateHandler,
    ) -> Result<(), DelegateRegistryError> {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(DelegateRegistryError::DuplicateDelegate(name));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    pub fn get(&self, name: &DelegateName) -> Option<DelegateHandler> {
        self.handlers.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Resolve and invoke `name`, surfacing `UnknownDelegate` if absent —
    /// the dispatcher's step 4 in §4.5.
    pub async fn invoke(
        &self,
        name: &DelegateName,
        scope: Arc<ServiceScope>,
        ctx: DispatchContext,
        args: Vec<Value>,
    ) -> Result<Value, NeatooError> {
        let handler = self
            .get(name)
            .ok_or_else(|| NeatooError::UnknownDelegate(name.to_string()))?;
        handler(scope, ctx, args).await
    }
}
