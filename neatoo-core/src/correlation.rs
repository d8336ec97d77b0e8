//! Ambient correlation context: a per-logical-operation identifier that
//! survives `.await` points without tying itself to an OS thread.
//!
//! The dispatcher reads `X-Correlation-Id` from the incoming request (or
//! generates one), installs it for the duration of the operation via
//! [`CorrelationId::scope`], and echoes it in the response header. The
//! client stub reads the ambient id before sending a request and installs
//! a fresh one if none is set. The event scheduler snapshots the caller's
//! id and reinstalls it inside each worker's task so event logs trace back
//! to the request that triggered them.

use std::fmt;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static CURRENT: CorrelationId;
}

/// An opaque identifier tying one client request to its server-side work
/// and any events it spawns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        CorrelationId(id.into())
    }

    /// Generate a fresh opaque id.
    pub fn generate() -> Self {
        CorrelationId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The ambient id for the current logical operation, if one is set.
    pub fn get() -> Option<CorrelationId> {
        CURRENT.try_with(|id| id.clone()).ok()
    }

    /// Get-or-generate: returns the ambient id, or generates and returns a
    /// fresh one without installing it (callers that need it installed
    /// should use [`scope`](Self::scope) with the returned value).
    pub fn ensure() -> CorrelationId {
        Self::get().unwrap_or_else(CorrelationId::generate)
    }

    /// Run `f` with `self` as the ambient correlation id; the previous
    /// ambient value (if any) is restored once `f` returns, because
    /// `task_local!` scoping is itself stack-discipline-preserving.
    pub async fn scope<F, T>(self, f: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        CURRENT.scope(self, f).await
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        CorrelationId::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scope_installs_and_restores_ambient_id() {
        assert!(CorrelationId::get().is_none());

        let id = CorrelationId::new("abc-123");
        id.clone()
            .scope(async {
                assert_eq!(CorrelationId::get(), Some(CorrelationId::new("abc-123")));
            })
            .await;

        assert!(CorrelationId::get().is_none());
    }

    #[tokio::test]
    async fn ensure_generates_when_absent() {
        let id = CorrelationId::ensure();
        assert!(!id.as_str().is_empty());
    }

    #[tokio::test]
    async fn nested_scopes_restore_outer_id() {
        let outer = CorrelationId::new("outer");
        outer
            .clone()
            .scope(async {
                let inner = CorrelationId::new("inner");
                inner
                    .scope(async {
                        assert_eq!(CorrelationId::get(), Some(CorrelationId::new("inner")));
                    })
                    .await;
                assert_eq!(CorrelationId::get(), Some(CorrelationId::new("outer")));
            })
            .await;
    }
}
