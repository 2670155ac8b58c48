//! The single entry point for session, presence, unread and typing
//! operations.
//!
//! Every operation takes the acting user's id explicitly; nothing is read
//! from ambient context. State changes that other devices care about are
//! published on the [`ChatEventBus`].

use std::collections::BTreeSet;
use std::sync::Arc;

use folio_core::clock::Clock;
use folio_core::date_label;
use folio_core::device::DeviceMetadata;
use folio_core::error::CoreError;
use folio_core::events::ChatEvent;
use folio_core::presence::{PresenceChange, PresenceView};
use folio_core::types::{DbId, SessionId, Timestamp};
use folio_db::models::session::Session;
use folio_db::SharedStore;

use crate::config::ChatConfig;
use crate::events::{Audience, ChatEventBus};
use crate::guard::StoreGuard;
use crate::presence::{PresenceTracker, ResolvedPresence};
use crate::session_store::{IssuedSession, SessionStore};
use crate::status::StatusSnapshot;
use crate::typing::TypingTracker;
use crate::unread::UnreadCounter;

pub struct ChatSessionFacade {
    store: SharedStore,
    sessions: Arc<SessionStore>,
    presence: PresenceTracker,
    unread: UnreadCounter,
    typing: TypingTracker,
    events: Arc<ChatEventBus>,
    guard: StoreGuard,
}

impl ChatSessionFacade {
    pub fn new(
        store: SharedStore,
        clock: Arc<dyn Clock>,
        config: &ChatConfig,
        events: Arc<ChatEventBus>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(store.clone(), clock.clone(), config));
        Self {
            presence: PresenceTracker::new(store.clone(), sessions.clone(), clock.clone(), config),
            unread: UnreadCounter::new(store.clone(), clock.clone(), config),
            typing: TypingTracker::new(store.clone(), clock, config),
            guard: StoreGuard::new(config.store_timeout),
            sessions,
            store,
            events,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn events(&self) -> &Arc<ChatEventBus> {
        &self.events
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Create a session after the caller has verified credentials, and bring
    /// the user online.
    ///
    /// Presence is derived from sessions on every read, so a failed presence
    /// write is logged rather than failing the login.
    pub async fn login(
        &self,
        user_id: DbId,
        device: &DeviceMetadata,
    ) -> Result<IssuedSession, CoreError> {
        let issued = self.sessions.create_session(user_id, device).await?;

        match self.presence.on_session_opened(user_id).await {
            Ok(change) => self.publish_presence_change(user_id, change).await,
            Err(e) => tracing::warn!(user_id, error = %e, "Presence update after login failed"),
        }
        Ok(issued)
    }

    /// Validate a bearer token. Activity refreshes also advance the user's
    /// last-seen time.
    pub async fn authenticate(&self, token: &str) -> Result<Session, CoreError> {
        let auth = self.sessions.validate(token).await?;
        if auth.activity_refreshed {
            if let Err(e) = self.presence.touch(auth.session.user_id).await {
                tracing::warn!(user_id = auth.session.user_id, error = %e, "Presence touch failed");
            }
        }
        Ok(auth.session)
    }

    /// Revoke the caller's own session.
    pub async fn logout(&self, session: &Session) -> Result<(), CoreError> {
        self.revoke_session(session.user_id, session.id).await
    }

    /// Revoke one of `user_id`'s sessions. Sessions of other users are
    /// reported as not found. Idempotent.
    pub async fn revoke_session(&self, user_id: DbId, session_id: SessionId) -> Result<(), CoreError> {
        let not_found = || CoreError::NotFound {
            entity: "session",
            id: session_id.to_string(),
        };
        let session = self.sessions.find(session_id).await?.ok_or_else(not_found)?;
        if session.user_id != user_id {
            return Err(not_found());
        }

        let result = self.sessions.revoke(session_id).await?;
        if result.newly_revoked {
            self.events
                .publish(Audience::User(user_id), ChatEvent::SessionRevoked { session_id });
        }
        self.after_sessions_closed(user_id).await
    }

    /// Revoke every session of `user_id`. Returns how many were revoked.
    pub async fn revoke_all(&self, user_id: DbId) -> Result<usize, CoreError> {
        let revoked = self.sessions.revoke_all(user_id).await?;
        for session in &revoked {
            self.events.publish(
                Audience::User(user_id),
                ChatEvent::SessionRevoked { session_id: session.id },
            );
        }
        self.after_sessions_closed(user_id).await?;
        Ok(revoked.len())
    }

    /// Fails with the matching [`AuthFailure`](folio_core::error::AuthFailure)
    /// once `session_id` is revoked, expired or gone.
    pub async fn check_session(&self, session_id: SessionId) -> Result<(), CoreError> {
        self.sessions.check(session_id).await
    }

    /// Active sessions of `user_id`, newest first.
    pub async fn list_sessions(&self, user_id: DbId) -> Result<Vec<Session>, CoreError> {
        self.sessions.list_active(user_id).await
    }

    async fn after_sessions_closed(&self, user_id: DbId) -> Result<(), CoreError> {
        let change = self.presence.on_session_closed(user_id).await?;
        self.publish_presence_change(user_id, change).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Presence
    // -----------------------------------------------------------------------

    /// Presence of `user_id` as `viewer_id` may see it.
    pub async fn get_presence(
        &self,
        user_id: DbId,
        viewer_id: Option<DbId>,
    ) -> Result<PresenceView, CoreError> {
        let resolved = self.presence.resolve(user_id).await?;
        if resolved.change.is_some() {
            self.publish_presence(&resolved);
        }
        Ok(resolved.view_for(viewer_id))
    }

    /// Flip the caller's `hide_last_seen`; returns the new value.
    pub async fn toggle_global_status(&self, user_id: DbId) -> Result<bool, CoreError> {
        let hidden = self.presence.toggle_hide_last_seen(user_id).await?;
        self.events.publish(
            Audience::User(user_id),
            ChatEvent::StatusChanged { hide_last_seen: hidden },
        );
        Ok(hidden)
    }

    pub async fn set_hide_last_seen(&self, user_id: DbId, hidden: bool) -> Result<bool, CoreError> {
        let hidden = self.presence.set_hide_last_seen(user_id, hidden).await?;
        self.events.publish(
            Audience::User(user_id),
            ChatEvent::StatusChanged { hide_last_seen: hidden },
        );
        Ok(hidden)
    }

    pub async fn global_hide_status(&self, user_id: DbId) -> Result<bool, CoreError> {
        self.presence.hide_last_seen(user_id).await
    }

    async fn publish_presence_change(&self, user_id: DbId, change: PresenceChange) {
        if !change.flipped() {
            return;
        }
        match self.presence.resolve(user_id).await {
            Ok(resolved) => self.publish_presence(&resolved),
            Err(e) => tracing::warn!(user_id, error = %e, "Presence broadcast skipped"),
        }
    }

    fn publish_presence(&self, resolved: &ResolvedPresence) {
        let view = resolved.view_for(None);
        self.events.publish(
            Audience::Everyone,
            ChatEvent::PresenceChanged {
                user_id: view.user_id,
                is_online: view.is_online,
                last_seen_at: view.last_seen_at,
            },
        );
    }

    // -----------------------------------------------------------------------
    // Unread
    // -----------------------------------------------------------------------

    /// Total unread count of `user_id`, read through to the store.
    pub async fn refresh_unread_count(&self, user_id: DbId) -> Result<i64, CoreError> {
        self.unread.total_unread(user_id).await
    }

    pub async fn thread_unread(&self, user_id: DbId, thread_id: &str) -> Result<i64, CoreError> {
        self.unread.thread_unread(user_id, thread_id).await
    }

    /// A message by `author_id` arrived in `thread_id`. Clears the author's
    /// typing indicator, counts the message for every other recipient and
    /// pushes each recipient's new total. Returns the recipients counted.
    pub async fn on_message(
        &self,
        thread_id: &str,
        author_id: DbId,
        recipient_ids: &[DbId],
    ) -> Result<Vec<DbId>, CoreError> {
        let counts = self.unread.on_message(thread_id, author_id, recipient_ids).await?;

        if let Err(e) = self.typing.stop(thread_id, author_id).await {
            tracing::warn!(thread_id, author_id, error = %e, "Clearing typing indicator failed");
        }

        let mut notified = Vec::with_capacity(counts.len());
        for (recipient, _) in counts {
            self.push_unread_total(recipient).await;
            notified.push(recipient);
        }
        Ok(notified)
    }

    /// Reset `thread_id` for `user_id`. Returns the new total, which is also
    /// pushed to the user's other devices.
    pub async fn mark_read(&self, user_id: DbId, thread_id: &str) -> Result<i64, CoreError> {
        self.unread.mark_read(user_id, thread_id).await?;
        let total = self.unread.total_unread(user_id).await?;
        self.events.publish(
            Audience::User(user_id),
            ChatEvent::UnreadChanged { unread_count: total },
        );
        Ok(total)
    }

    async fn push_unread_total(&self, user_id: DbId) {
        match self.unread.total_unread(user_id).await {
            Ok(total) => self.events.publish(
                Audience::User(user_id),
                ChatEvent::UnreadChanged { unread_count: total },
            ),
            Err(e) => tracing::warn!(user_id, error = %e, "Unread push skipped"),
        }
    }

    /// Current badge state of `user_id`.
    pub async fn status(&self, user_id: DbId) -> Result<StatusSnapshot, CoreError> {
        let unread_count = self.refresh_unread_count(user_id).await?;
        let global_hide_status = self.global_hide_status(user_id).await?;
        Ok(StatusSnapshot {
            unread_count,
            global_hide_status,
            is_status_loading: false,
        })
    }

    // -----------------------------------------------------------------------
    // Typing
    // -----------------------------------------------------------------------

    /// Mark `user_id` as typing in `thread_id`. Idempotent.
    pub async fn typing(&self, thread_id: &str, user_id: DbId) -> Result<Timestamp, CoreError> {
        self.typing.typing(thread_id, user_id).await
    }

    /// Users typing in `thread_id` other than `excluding_user_id`.
    pub async fn is_typing(
        &self,
        thread_id: &str,
        excluding_user_id: DbId,
    ) -> Result<BTreeSet<DbId>, CoreError> {
        self.typing.is_typing(thread_id, Some(excluding_user_id)).await
    }

    // -----------------------------------------------------------------------
    // Misc
    // -----------------------------------------------------------------------

    /// Day-bucket label for a message timestamp.
    pub fn render_date_label(timestamp: Timestamp, now: Timestamp) -> String {
        date_label::render_date_label(timestamp, now)
    }

    /// Liveness of the backing store.
    pub async fn ping(&self) -> Result<(), CoreError> {
        self.guard.call("store.ping", self.store.ping()).await
    }
}
