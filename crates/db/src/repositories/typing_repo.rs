//! Repository for the `typing` collection.

use folio_core::types::{DbId, Timestamp};

use crate::models::millis;
use crate::models::typing::{doc_id, TypingEntry, COLLECTION};
use crate::store::{from_document, DocumentStore, Filter, StoreResult, Update};

pub struct TypingRepo;

impl TypingRepo {
    /// Create or refresh the `(thread, user)` entry. Last write wins.
    pub async fn upsert(
        store: &dyn DocumentStore,
        thread_id: &str,
        user_id: DbId,
        expires_at: Timestamp,
    ) -> StoreResult<TypingEntry> {
        let update = Update::new()
            .set("thread_id", thread_id)
            .set("user_id", user_id)
            .set("expires_at", millis(expires_at));
        let updated = store
            .upsert(COLLECTION, &doc_id(thread_id, user_id), &update)
            .await?;
        from_document(updated.current)
    }

    /// Entries of a thread that have not expired at `now`.
    pub async fn list_live(
        store: &dyn DocumentStore,
        thread_id: &str,
        now: Timestamp,
    ) -> StoreResult<Vec<TypingEntry>> {
        let filter = Filter::new()
            .eq("thread_id", thread_id)
            .gt("expires_at", millis(now));
        store
            .find_by(COLLECTION, &filter)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Remove the `(thread, user)` entry. Returns whether one existed.
    pub async fn clear(store: &dyn DocumentStore, thread_id: &str, user_id: DbId) -> StoreResult<bool> {
        let filter = Filter::new()
            .eq("thread_id", thread_id)
            .eq("user_id", user_id);
        Ok(store.delete_many(COLLECTION, &filter).await? > 0)
    }
}
