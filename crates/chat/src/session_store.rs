//! Session issuance, validation and revocation.

use std::sync::Arc;

use chrono::Duration;
use folio_core::clock::Clock;
use folio_core::device::{DeviceInfo, DeviceMetadata};
use folio_core::error::{AuthFailure, CoreError};
use folio_core::session::{
    generate_session_token, hash_session_token, is_well_formed_token, needs_activity_refresh,
};
use folio_core::types::{DbId, SessionId, Timestamp};
use folio_db::models::session::{CreateSession, Session};
use folio_db::repositories::{RevokeResult, SessionRepo};
use folio_db::SharedStore;

use crate::config::ChatConfig;
use crate::guard::StoreGuard;

/// A freshly created session together with its plaintext token.
///
/// This is the only place the raw token ever exists server-side.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: Session,
    pub token: String,
}

/// A session that passed validation.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub session: Session,
    /// Whether `last_active_at` was rewritten by this validation.
    pub activity_refreshed: bool,
}

/// Stored sessions of one user, classified at one instant.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub active: Vec<Session>,
    /// Latest expiry at or before the instant among non-revoked sessions.
    pub latest_lapse: Option<Timestamp>,
}

pub struct SessionStore {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    guard: StoreGuard,
    ttl: Duration,
    refresh_threshold: Duration,
    retention: Duration,
}

impl SessionStore {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>, config: &ChatConfig) -> Self {
        Self {
            store,
            clock,
            guard: StoreGuard::new(config.store_timeout),
            ttl: config.session_ttl,
            refresh_threshold: config.activity_refresh,
            retention: config.expired_retention,
        }
    }

    /// Issue a new session for `user_id`.
    ///
    /// Sessions of the same user that expired more than the retention window
    /// ago are collected first.
    pub async fn create_session(
        &self,
        user_id: DbId,
        device: &DeviceMetadata,
    ) -> Result<IssuedSession, CoreError> {
        let now = self.clock.now();
        let store = self.store.as_ref();

        let cutoff = now - self.retention;
        match self
            .guard
            .call("sessions.gc", SessionRepo::delete_expired_before(store, user_id, cutoff))
            .await
        {
            Ok(0) => {}
            Ok(collected) => tracing::debug!(user_id, collected, "Collected expired sessions"),
            Err(e) => tracing::warn!(user_id, error = %e, "Expired session collection failed"),
        }

        let token = generate_session_token();
        let device_label = DeviceInfo::from_metadata(device).label();
        let input = CreateSession {
            user_id,
            token_hash: token.hash,
            device_label,
            user_agent: device.stored_user_agent(),
            ip_address: device.source_ip.clone(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        let session = self
            .guard
            .call("sessions.create", SessionRepo::create(store, &input))
            .await?;

        tracing::info!(
            user_id,
            session_id = %session.id,
            device = %session.device_label,
            "Session created",
        );
        Ok(IssuedSession {
            session,
            token: token.plaintext,
        })
    }

    /// Resolve a bearer token to an active session.
    ///
    /// Fails with [`AuthFailure`] when the token is unknown, revoked or
    /// expired. `last_active_at` is rewritten only when older than the
    /// refresh threshold, and a failed rewrite does not fail validation.
    pub async fn validate(&self, token: &str) -> Result<Authenticated, CoreError> {
        if !is_well_formed_token(token) {
            return Err(AuthFailure::NotFound.into());
        }
        let hash = hash_session_token(token);
        let store = self.store.as_ref();

        let mut session = self
            .guard
            .call("sessions.find_by_token", SessionRepo::find_by_token_hash(store, &hash))
            .await?
            .ok_or(AuthFailure::NotFound)?;

        let now = self.clock.now();
        session.state(now).check()?;

        if !needs_activity_refresh(session.last_active_at, now, self.refresh_threshold) {
            return Ok(Authenticated {
                session,
                activity_refreshed: false,
            });
        }

        let refreshed = match self
            .guard
            .call("sessions.touch", SessionRepo::touch(store, session.id, now))
            .await
        {
            Ok(Some(updated)) => {
                // A revoke may have landed between the read and the touch.
                updated.state(now).check()?;
                session = updated;
                true
            }
            Ok(None) => return Err(AuthFailure::NotFound.into()),
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "Activity refresh failed");
                false
            }
        };

        Ok(Authenticated {
            session,
            activity_refreshed: refreshed,
        })
    }

    pub async fn find(&self, session_id: SessionId) -> Result<Option<Session>, CoreError> {
        self.guard
            .call("sessions.find", SessionRepo::find_by_id(self.store.as_ref(), session_id))
            .await
    }

    /// Whether `session_id` may still act, by id rather than token. Used to
    /// sweep long-lived connections; never touches `last_active_at`.
    pub async fn check(&self, session_id: SessionId) -> Result<(), CoreError> {
        let session = self.find(session_id).await?.ok_or(AuthFailure::NotFound)?;
        session.state(self.clock.now()).check()?;
        Ok(())
    }

    /// Revoke one session. Revoking an already-revoked session succeeds with
    /// `newly_revoked = false`.
    pub async fn revoke(&self, session_id: SessionId) -> Result<RevokeResult, CoreError> {
        let result = self
            .guard
            .call("sessions.revoke", SessionRepo::revoke(self.store.as_ref(), session_id))
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "session",
                id: session_id.to_string(),
            })?;

        if result.newly_revoked {
            tracing::info!(
                user_id = result.session.user_id,
                session_id = %session_id,
                "Session revoked",
            );
        }
        Ok(result)
    }

    /// Revoke every session of `user_id`. Returns the sessions this call
    /// revoked; already-revoked ones are skipped.
    pub async fn revoke_all(&self, user_id: DbId) -> Result<Vec<Session>, CoreError> {
        let revoked = self
            .guard
            .call(
                "sessions.revoke_all",
                SessionRepo::revoke_all_for_user(self.store.as_ref(), user_id),
            )
            .await?;
        tracing::info!(user_id, count = revoked.len(), "All sessions revoked");
        Ok(revoked)
    }

    /// Non-revoked, non-expired sessions of `user_id`, newest first.
    pub async fn list_active(&self, user_id: DbId) -> Result<Vec<Session>, CoreError> {
        Ok(self.snapshot(user_id).await?.active)
    }

    /// The most recent instant a non-revoked session of `user_id` expired.
    pub async fn latest_lapse(&self, user_id: DbId) -> Result<Option<Timestamp>, CoreError> {
        Ok(self.snapshot(user_id).await?.latest_lapse)
    }

    /// Classify every stored session of `user_id` at the current instant.
    pub async fn snapshot(&self, user_id: DbId) -> Result<SessionSnapshot, CoreError> {
        let sessions = self
            .guard
            .call("sessions.list", SessionRepo::list_for_user(self.store.as_ref(), user_id))
            .await?;
        let now = self.clock.now();

        let mut snapshot = SessionSnapshot::default();
        for session in sessions {
            if session.is_active(now) {
                snapshot.active.push(session);
            } else if !session.revoked {
                snapshot.latest_lapse = snapshot.latest_lapse.max(Some(session.expires_at));
            }
        }
        Ok(snapshot)
    }
}
