//! Online/offline state derived from active sessions.
//!
//! The stored `is_online` flag is a hint for change detection only; reads
//! always recompute it from [`SessionStore`] so an abrupt disconnect can never
//! leave a user stuck online.

use std::sync::Arc;

use folio_core::clock::Clock;
use folio_core::error::CoreError;
use folio_core::presence::{visible_last_seen, PresenceChange, PresenceView};
use folio_core::types::DbId;
use folio_db::models::presence::Presence;
use folio_db::repositories::PresenceRepo;
use folio_db::SharedStore;

use crate::config::ChatConfig;
use crate::guard::StoreGuard;
use crate::session_store::SessionStore;

/// Presence as of one read, after reconciliation.
#[derive(Debug, Clone)]
pub struct ResolvedPresence {
    pub presence: Presence,
    /// Set when this read found a stale online flag and corrected it.
    pub change: Option<PresenceChange>,
}

impl ResolvedPresence {
    /// The record as `viewer_id` may see it.
    pub fn view_for(&self, viewer_id: Option<DbId>) -> PresenceView {
        let p = &self.presence;
        PresenceView {
            user_id: p.user_id,
            is_online: p.is_online,
            last_seen_at: visible_last_seen(p.user_id, viewer_id, p.hide_last_seen, p.last_seen_at),
        }
    }
}

pub struct PresenceTracker {
    store: SharedStore,
    sessions: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    guard: StoreGuard,
}

impl PresenceTracker {
    pub fn new(
        store: SharedStore,
        sessions: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            store,
            sessions,
            clock,
            guard: StoreGuard::new(config.store_timeout),
        }
    }

    /// A session of `user_id` was opened: mark online and stamp last seen.
    pub async fn on_session_opened(&self, user_id: DbId) -> Result<PresenceChange, CoreError> {
        let now = self.clock.now();
        let change = self
            .guard
            .call("presence.online", PresenceRepo::mark_online(self.store.as_ref(), user_id, now))
            .await?;
        if change.flipped() {
            tracing::info!(user_id, "User came online");
        }
        Ok(change)
    }

    /// A session of `user_id` was closed. Goes offline only when no other
    /// session is still active.
    pub async fn on_session_closed(&self, user_id: DbId) -> Result<PresenceChange, CoreError> {
        let remaining = self.sessions.list_active(user_id).await?;
        if !remaining.is_empty() {
            tracing::debug!(user_id, remaining = remaining.len(), "Session closed, user still online");
            return Ok(PresenceChange::new(true, true));
        }

        let now = self.clock.now();
        let change = self
            .guard
            .call("presence.offline", PresenceRepo::mark_offline(self.store.as_ref(), user_id, now))
            .await?;

        // A login may have opened a session and marked online between the
        // listing and the write above.
        if !self.sessions.list_active(user_id).await?.is_empty() {
            self.guard
                .call("presence.online", PresenceRepo::mark_online(self.store.as_ref(), user_id, now))
                .await?;
            tracing::debug!(user_id, "Session opened while going offline, user still online");
            return Ok(PresenceChange::new(change.was_online, true));
        }

        if change.flipped() {
            tracing::info!(user_id, "User went offline");
        }
        Ok(change)
    }

    /// Advance `last_seen_at` on authenticated activity.
    pub async fn touch(&self, user_id: DbId) -> Result<(), CoreError> {
        let now = self.clock.now();
        self.guard
            .call("presence.touch", PresenceRepo::touch(self.store.as_ref(), user_id, now))
            .await
    }

    /// Presence of `user_id` as `viewer_id` may see it.
    pub async fn get_presence(
        &self,
        user_id: DbId,
        viewer_id: Option<DbId>,
    ) -> Result<PresenceView, CoreError> {
        Ok(self.resolve(user_id).await?.view_for(viewer_id))
    }

    /// Read presence, recomputing `is_online` from the active sessions.
    ///
    /// A stored online flag with no active session left means the last
    /// session lapsed without a close; the record is moved offline with
    /// `last_seen_at` stamped at the lapse. Retried once when the store is
    /// unavailable.
    pub async fn resolve(&self, user_id: DbId) -> Result<ResolvedPresence, CoreError> {
        self.guard
            .read("presence.get", move || self.resolve_once(user_id))
            .await
    }

    async fn resolve_once(&self, user_id: DbId) -> Result<ResolvedPresence, CoreError> {
        let store = self.store.as_ref();
        let stored = self
            .guard
            .call("presence.find", PresenceRepo::find(store, user_id))
            .await?
            .unwrap_or_else(|| Presence::offline(user_id));
        let sessions = self.sessions.snapshot(user_id).await?;
        let is_online = !sessions.active.is_empty();

        if stored.is_online && !is_online {
            let now = self.clock.now();
            let lapse = sessions.latest_lapse.unwrap_or(now).min(now);
            let change = self
                .guard
                .call("presence.reconcile", PresenceRepo::mark_offline(store, user_id, lapse))
                .await?;
            tracing::info!(user_id, lapsed_at = %lapse, "Reconciled stale online presence");

            let presence = Presence {
                is_online: false,
                last_seen_at: stored.last_seen_at.max(Some(lapse)),
                ..stored
            };
            return Ok(ResolvedPresence {
                presence,
                change: change.flipped().then_some(change),
            });
        }

        Ok(ResolvedPresence {
            presence: Presence { is_online, ..stored },
            change: None,
        })
    }

    pub async fn set_hide_last_seen(&self, user_id: DbId, hidden: bool) -> Result<bool, CoreError> {
        let presence = self
            .guard
            .call(
                "presence.set_hide",
                PresenceRepo::set_hide_last_seen(self.store.as_ref(), user_id, hidden),
            )
            .await?;
        Ok(presence.hide_last_seen)
    }

    /// Flip `hide_last_seen`; returns the new value.
    pub async fn toggle_hide_last_seen(&self, user_id: DbId) -> Result<bool, CoreError> {
        let hidden = self
            .guard
            .call(
                "presence.toggle_hide",
                PresenceRepo::toggle_hide_last_seen(self.store.as_ref(), user_id),
            )
            .await?;
        tracing::info!(user_id, hidden, "Last-seen visibility toggled");
        Ok(hidden)
    }

    /// The owner's current `hide_last_seen` preference.
    pub async fn hide_last_seen(&self, user_id: DbId) -> Result<bool, CoreError> {
        self.guard
            .read("presence.hide_status", move || async move {
                let presence = self
                    .guard
                    .call("presence.find", PresenceRepo::find(self.store.as_ref(), user_id))
                    .await?;
                Ok(presence.is_some_and(|p| p.hide_last_seen))
            })
            .await
    }
}
