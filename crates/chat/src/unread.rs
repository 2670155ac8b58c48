//! Per-(user, thread) unread counters.
//!
//! Increments and resets are single atomic document operations, so a
//! `mark_read` racing an `on_message` lands on one side of it: never a lost
//! increment that happened after the read, never a negative count.

use std::collections::BTreeSet;
use std::sync::Arc;

use folio_core::clock::Clock;
use folio_core::error::CoreError;
use folio_core::types::DbId;
use folio_core::unread::{check_unread_count, validate_thread_id};
use folio_db::models::unread::UnreadState;
use folio_db::repositories::UnreadRepo;
use folio_db::SharedStore;

use crate::config::ChatConfig;
use crate::guard::StoreGuard;

pub struct UnreadCounter {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    guard: StoreGuard,
}

impl UnreadCounter {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>, config: &ChatConfig) -> Self {
        Self {
            store,
            clock,
            guard: StoreGuard::new(config.store_timeout),
        }
    }

    /// Count one new message in `thread_id` for every recipient other than
    /// the author. Returns `(recipient, new thread count)` pairs.
    ///
    /// Every recipient's stored count is checked before the first write, so
    /// a negative record aborts the call with nothing incremented. Each
    /// increment also refuses to touch a negative count. A store failure
    /// midway still leaves earlier recipients incremented.
    pub async fn on_message(
        &self,
        thread_id: &str,
        author_id: DbId,
        recipient_ids: &[DbId],
    ) -> Result<Vec<(DbId, i64)>, CoreError> {
        validate_thread_id(thread_id)?;

        let recipients: BTreeSet<DbId> = recipient_ids
            .iter()
            .copied()
            .filter(|&id| id != author_id)
            .collect();

        for &recipient in &recipients {
            self.thread_unread(recipient, thread_id).await?;
        }

        let mut counts = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let count = self
                .guard
                .call(
                    "unread.increment",
                    UnreadRepo::increment(self.store.as_ref(), recipient, thread_id),
                )
                .await
                .inspect_err(|e| {
                    if matches!(e, CoreError::InvariantViolation(_)) {
                        tracing::error!(user_id = recipient, thread_id, error = %e, "Unread invariant violated");
                    }
                })?;
            counts.push((recipient, count));
        }

        tracing::debug!(thread_id, author_id, recipients = counts.len(), "Message counted");
        Ok(counts)
    }

    /// Reset `thread_id` to zero for `user_id` and stamp `last_read_at`.
    /// Never retried.
    pub async fn mark_read(&self, user_id: DbId, thread_id: &str) -> Result<UnreadState, CoreError> {
        validate_thread_id(thread_id)?;
        let now = self.clock.now();
        let state = self
            .guard
            .call(
                "unread.mark_read",
                UnreadRepo::mark_read(self.store.as_ref(), user_id, thread_id, now),
            )
            .await?;
        tracing::debug!(user_id, thread_id, "Thread marked read");
        Ok(state)
    }

    /// Sum of unread counts across all threads of `user_id`.
    pub async fn total_unread(&self, user_id: DbId) -> Result<i64, CoreError> {
        let states = self.list_threads(user_id).await?;
        let mut total: i64 = 0;
        for state in &states {
            let count = checked(user_id, &state.thread_id, state.unread_count)?;
            total = total.saturating_add(count);
        }
        Ok(total)
    }

    pub async fn thread_unread(&self, user_id: DbId, thread_id: &str) -> Result<i64, CoreError> {
        validate_thread_id(thread_id)?;
        let state = self
            .guard
            .read("unread.thread", move || {
                self.guard
                    .call("unread.find", UnreadRepo::find(self.store.as_ref(), user_id, thread_id))
            })
            .await?;
        match state {
            Some(state) => checked(user_id, thread_id, state.unread_count),
            None => Ok(0),
        }
    }

    /// Every thread record of `user_id`. Retried once when the store is
    /// unavailable.
    pub async fn list_threads(&self, user_id: DbId) -> Result<Vec<UnreadState>, CoreError> {
        self.guard
            .read("unread.list", move || {
                self.guard
                    .call("unread.list", UnreadRepo::list_for_user(self.store.as_ref(), user_id))
            })
            .await
    }
}

/// Reject a negative count, logging the violation.
fn checked(user_id: DbId, thread_id: &str, count: i64) -> Result<i64, CoreError> {
    check_unread_count(user_id, thread_id, count).inspect_err(|e| {
        tracing::error!(user_id, thread_id, count, error = %e, "Unread invariant violated");
    })
}
