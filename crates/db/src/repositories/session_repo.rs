//! Repository for the `sessions` collection.

use folio_core::types::{DbId, SessionId, Timestamp};
use uuid::Uuid;

use crate::models::millis;
use crate::models::session::{CreateSession, Session, COLLECTION};
use crate::store::{from_document, to_document, DocumentStore, Filter, StoreResult, Update};

/// Outcome of revoking a single session.
#[derive(Debug, Clone)]
pub struct RevokeResult {
    pub session: Session,
    /// `false` when the session was already revoked.
    pub newly_revoked: bool,
}

/// Provides CRUD operations for sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the stored document.
    ///
    /// Fails with `Conflict` if the token hash is already in use.
    pub async fn create(store: &dyn DocumentStore, input: &CreateSession) -> StoreResult<Session> {
        let session = Session {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            token_hash: input.token_hash.clone(),
            device_label: input.device_label.clone(),
            user_agent: input.user_agent.clone(),
            ip_address: input.ip_address.clone(),
            created_at: input.created_at,
            last_active_at: input.created_at,
            expires_at: input.expires_at,
            revoked: false,
        };
        store
            .insert(COLLECTION, &session.id.to_string(), to_document(&session)?)
            .await?;
        Ok(session)
    }

    pub async fn find_by_id(store: &dyn DocumentStore, id: SessionId) -> StoreResult<Option<Session>> {
        store
            .find(COLLECTION, &id.to_string())
            .await?
            .map(from_document)
            .transpose()
    }

    /// Find a session by token hash regardless of its state.
    pub async fn find_by_token_hash(
        store: &dyn DocumentStore,
        hash: &str,
    ) -> StoreResult<Option<Session>> {
        let docs = store
            .find_by(COLLECTION, &Filter::new().eq("token_hash", hash))
            .await?;
        docs.into_iter().next().map(from_document).transpose()
    }

    /// Every stored session of a user, newest first, including revoked and
    /// expired ones that have not been collected yet.
    pub async fn list_for_user(store: &dyn DocumentStore, user_id: DbId) -> StoreResult<Vec<Session>> {
        let docs = store
            .find_by(COLLECTION, &Filter::new().eq("user_id", user_id))
            .await?;
        let mut sessions = docs
            .into_iter()
            .map(from_document)
            .collect::<StoreResult<Vec<Session>>>()?;
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    /// Advance `last_active_at` to `at` (never backwards). Only touches that
    /// one field so a concurrent revoke is never overwritten.
    pub async fn touch(
        store: &dyn DocumentStore,
        id: SessionId,
        at: Timestamp,
    ) -> StoreResult<Option<Session>> {
        let update = Update::new().max("last_active_at", millis(at));
        store
            .update(COLLECTION, &id.to_string(), &update, false)
            .await?
            .map(|u| from_document(u.current))
            .transpose()
    }

    /// Set the revoked flag. Idempotent; `None` if the session does not exist.
    pub async fn revoke(store: &dyn DocumentStore, id: SessionId) -> StoreResult<Option<RevokeResult>> {
        let update = Update::new().set("revoked", true);
        let Some(updated) = store
            .update(COLLECTION, &id.to_string(), &update, false)
            .await?
        else {
            return Ok(None);
        };

        let was_revoked = updated
            .previous
            .as_ref()
            .and_then(|prev| prev.get("revoked"))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        Ok(Some(RevokeResult {
            session: from_document(updated.current)?,
            newly_revoked: !was_revoked,
        }))
    }

    /// Revoke every non-revoked session of a user. Returns the sessions this
    /// call revoked.
    pub async fn revoke_all_for_user(
        store: &dyn DocumentStore,
        user_id: DbId,
    ) -> StoreResult<Vec<Session>> {
        let filter = Filter::new().eq("user_id", user_id).eq("revoked", false);
        let mut revoked = Vec::new();
        for doc in store.find_by(COLLECTION, &filter).await? {
            let session: Session = from_document(doc)?;
            if let Some(result) = Self::revoke(store, session.id).await? {
                if result.newly_revoked {
                    revoked.push(result.session);
                }
            }
        }
        Ok(revoked)
    }

    /// Delete a user's sessions that expired before `cutoff`. Returns the
    /// count of deleted documents.
    pub async fn delete_expired_before(
        store: &dyn DocumentStore,
        user_id: DbId,
        cutoff: Timestamp,
    ) -> StoreResult<u64> {
        let filter = Filter::new()
            .eq("user_id", user_id)
            .lt("expires_at", millis(cutoff));
        store.delete_many(COLLECTION, &filter).await
    }
}
