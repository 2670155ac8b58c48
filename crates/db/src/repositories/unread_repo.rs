//! Repository for the `unread` collection.

use folio_core::types::{DbId, Timestamp};

use crate::models::millis;
use crate::models::unread::{doc_id, UnreadState, COLLECTION};
use crate::store::{from_document, DocumentStore, Filter, StoreResult, Update};

/// Provides atomic counter operations on per-(user, thread) unread state.
pub struct UnreadRepo;

impl UnreadRepo {
    /// Add one unread message for `user_id` in `thread_id`, creating the
    /// record on the first message. Returns the new count.
    ///
    /// A stored negative count fails with
    /// [`StoreError::Precondition`](crate::store::StoreError::Precondition) and
    /// is left as it was.
    pub async fn increment(store: &dyn DocumentStore, user_id: DbId, thread_id: &str) -> StoreResult<i64> {
        let seed = Update::new()
            .require_at_least("unread_count", 0)
            .set_on_insert("user_id", user_id)
            .set_on_insert("thread_id", thread_id);
        store
            .atomic_increment(COLLECTION, &doc_id(user_id, thread_id), "unread_count", 1, seed)
            .await
    }

    /// Reset the count to zero and stamp `last_read_at`, in one step.
    pub async fn mark_read(
        store: &dyn DocumentStore,
        user_id: DbId,
        thread_id: &str,
        at: Timestamp,
    ) -> StoreResult<UnreadState> {
        let update = Update::new()
            .set_on_insert("user_id", user_id)
            .set_on_insert("thread_id", thread_id)
            .set("unread_count", 0)
            .max("last_read_at", millis(at));
        let updated = store
            .upsert(COLLECTION, &doc_id(user_id, thread_id), &update)
            .await?;
        from_document(updated.current)
    }

    pub async fn find(
        store: &dyn DocumentStore,
        user_id: DbId,
        thread_id: &str,
    ) -> StoreResult<Option<UnreadState>> {
        store
            .find(COLLECTION, &doc_id(user_id, thread_id))
            .await?
            .map(from_document)
            .transpose()
    }

    /// Every thread record of a user, ordered by thread id.
    pub async fn list_for_user(store: &dyn DocumentStore, user_id: DbId) -> StoreResult<Vec<UnreadState>> {
        let docs = store
            .find_by(COLLECTION, &Filter::new().eq("user_id", user_id))
            .await?;
        let mut states = docs
            .into_iter()
            .map(from_document)
            .collect::<StoreResult<Vec<UnreadState>>>()?;
        states.sort_by(|a, b| a.thread_id.cmp(&b.thread_id));
        Ok(states)
    }
}
