//! Repository for the `presence` collection.

use folio_core::presence::PresenceChange;
use folio_core::types::{DbId, Timestamp};
use serde_json::Value;

use crate::models::millis;
use crate::models::presence::{Presence, COLLECTION};
use crate::store::{from_document, DocumentStore, StoreResult, Update, Updated};

/// Provides reads and atomic field updates for presence records.
pub struct PresenceRepo;

impl PresenceRepo {
    pub async fn find(store: &dyn DocumentStore, user_id: DbId) -> StoreResult<Option<Presence>> {
        store
            .find(COLLECTION, &user_id.to_string())
            .await?
            .map(from_document)
            .transpose()
    }

    /// Set `is_online = true` and advance `last_seen_at` to `at`.
    pub async fn mark_online(
        store: &dyn DocumentStore,
        user_id: DbId,
        at: Timestamp,
    ) -> StoreResult<PresenceChange> {
        Self::set_online(store, user_id, true, at).await
    }

    /// Set `is_online = false` and advance `last_seen_at` to `at`.
    pub async fn mark_offline(
        store: &dyn DocumentStore,
        user_id: DbId,
        at: Timestamp,
    ) -> StoreResult<PresenceChange> {
        Self::set_online(store, user_id, false, at).await
    }

    /// Advance `last_seen_at` without touching `is_online`.
    pub async fn touch(store: &dyn DocumentStore, user_id: DbId, at: Timestamp) -> StoreResult<()> {
        let update = seed(user_id).max("last_seen_at", millis(at));
        store.upsert(COLLECTION, &user_id.to_string(), &update).await?;
        Ok(())
    }

    pub async fn set_hide_last_seen(
        store: &dyn DocumentStore,
        user_id: DbId,
        hidden: bool,
    ) -> StoreResult<Presence> {
        let update = seed(user_id).set("hide_last_seen", hidden);
        let updated = store.upsert(COLLECTION, &user_id.to_string(), &update).await?;
        from_document(updated.current)
    }

    /// Flip `hide_last_seen` atomically. Returns the new value.
    pub async fn toggle_hide_last_seen(store: &dyn DocumentStore, user_id: DbId) -> StoreResult<bool> {
        let update = seed(user_id).toggle("hide_last_seen");
        let updated = store.upsert(COLLECTION, &user_id.to_string(), &update).await?;
        let presence: Presence = from_document(updated.current)?;
        Ok(presence.hide_last_seen)
    }

    async fn set_online(
        store: &dyn DocumentStore,
        user_id: DbId,
        online: bool,
        at: Timestamp,
    ) -> StoreResult<PresenceChange> {
        let update = seed(user_id)
            .set("is_online", online)
            .max("last_seen_at", millis(at));
        let updated = store.upsert(COLLECTION, &user_id.to_string(), &update).await?;
        Ok(PresenceChange::new(was_online(&updated), online))
    }
}

/// Fields a presence record is created with on first write.
fn seed(user_id: DbId) -> Update {
    Update::new()
        .set_on_insert("user_id", user_id)
        .set_on_insert("is_online", false)
        .set_on_insert("hide_last_seen", false)
}

fn was_online(updated: &Updated) -> bool {
    updated
        .previous
        .as_ref()
        .and_then(|prev| prev.get("is_online"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
