//! Per-invocation context a delegate handler receives alongside its
//! rebuilt arguments: the ambient correlation id and the linked
//! cancellation token described in §4.5/§5.

use neatoo_core::CorrelationId;
use tokio_util::sync::CancellationToken;

/// Handed to every delegate handler invocation. `cancellation` is the
/// dispatcher's linked token (client-disconnect ∪ shutdown) — handlers
/// that accept a cancellation slot read it from here rather than building
/// their own.
#[derive(Clone)]
pub struct DispatchContext {
    pub correlation_id: CorrelationId,
    pub cancellation: CancellationToken,
}

impl DispatchContext {
    pub fn new(correlation_id: CorrelationId, cancellation: CancellationToken) -> Self {
        DispatchContext { correlation_id, cancellation }
    }

    pub fn is_canceled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
