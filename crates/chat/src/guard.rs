//! Bounded store calls.
//!
//! Every store call on a hot path goes through [`StoreGuard::call`], which
//! converts a timeout into [`CoreError::StoreUnavailable`]. Read-only queries
//! may additionally use [`StoreGuard::read`] for a single retry; mutations
//! never retry.

use std::future::Future;
use std::time::Duration;

use folio_core::error::CoreError;
use folio_db::StoreResult;

#[derive(Debug, Clone, Copy)]
pub struct StoreGuard {
    timeout: Duration,
}

impl StoreGuard {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run one store call with the configured timeout.
    pub async fn call<T, F>(&self, op: &'static str, fut: F) -> Result<T, CoreError>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| {
                tracing::warn!(op, error = %e, "Store call failed");
                CoreError::from(e)
            }),
            Err(_) => {
                tracing::warn!(op, timeout_ms = self.timeout.as_millis() as u64, "Store call timed out");
                Err(CoreError::StoreUnavailable(format!(
                    "{op} timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }

    /// Run a read-only query, retrying once if the store was unavailable.
    pub async fn read<T, F, Fut>(&self, op: &'static str, mut query: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        match query().await {
            Err(e) if e.is_transient() => {
                tracing::debug!(op, error = %e, "Retrying read once");
                query().await
            }
            other => other,
        }
    }
}
