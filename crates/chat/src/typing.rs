//! Ephemeral "is typing" indicators with lazy expiry.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Duration;
use folio_core::clock::Clock;
use folio_core::error::CoreError;
use folio_core::types::{DbId, Timestamp};
use folio_core::typing::{is_live, typing_expiry};
use folio_core::unread::validate_thread_id;
use folio_db::repositories::TypingRepo;
use folio_db::SharedStore;

use crate::config::ChatConfig;
use crate::guard::StoreGuard;

pub struct TypingTracker {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    guard: StoreGuard,
    ttl: Duration,
}

impl TypingTracker {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>, config: &ChatConfig) -> Self {
        Self {
            store,
            clock,
            guard: StoreGuard::new(config.store_timeout),
            ttl: config.typing_ttl,
        }
    }

    /// Mark `user_id` as typing in `thread_id` for one TTL. Idempotent.
    /// Returns the new expiry.
    pub async fn typing(&self, thread_id: &str, user_id: DbId) -> Result<Timestamp, CoreError> {
        validate_thread_id(thread_id)?;
        let expires_at = typing_expiry(self.clock.now(), self.ttl);
        let entry = self
            .guard
            .call(
                "typing.upsert",
                TypingRepo::upsert(self.store.as_ref(), thread_id, user_id, expires_at),
            )
            .await?;
        Ok(entry.expires_at)
    }

    /// Users currently typing in `thread_id`, optionally excluding one.
    /// Expired entries are ignored, never swept.
    pub async fn is_typing(
        &self,
        thread_id: &str,
        excluding: Option<DbId>,
    ) -> Result<BTreeSet<DbId>, CoreError> {
        validate_thread_id(thread_id)?;
        let now = self.clock.now();
        let entries = self
            .guard
            .call("typing.list", TypingRepo::list_live(self.store.as_ref(), thread_id, now))
            .await?;
        Ok(entries
            .into_iter()
            .filter(|e| is_live(e.expires_at, now) && Some(e.user_id) != excluding)
            .map(|e| e.user_id)
            .collect())
    }

    /// Drop the entry of `user_id`, e.g. once their message arrives.
    pub async fn stop(&self, thread_id: &str, user_id: DbId) -> Result<bool, CoreError> {
        validate_thread_id(thread_id)?;
        self.guard
            .call("typing.clear", TypingRepo::clear(self.store.as_ref(), thread_id, user_id))
            .await
    }
}
