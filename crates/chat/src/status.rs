//! Badge state (unread count, hide status, loading flag) for one connection.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use folio_core::error::CoreError;
use folio_core::events::ChatEvent;
use folio_core::types::DbId;
use serde::Serialize;

use crate::facade::ChatSessionFacade;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub unread_count: i64,
    pub global_hide_status: bool,
    pub is_status_loading: bool,
}

impl From<StatusSnapshot> for ChatEvent {
    fn from(s: StatusSnapshot) -> Self {
        ChatEvent::StatusSnapshot {
            unread_count: s.unread_count,
            global_hide_status: s.global_hide_status,
            is_status_loading: s.is_status_loading,
        }
    }
}

/// Connection-scoped copy of a user's badge state.
///
/// Lives only as long as the connection that owns it; every refresh reads
/// through to the store. `is_status_loading` is true exactly while at least
/// one refresh is awaiting the store.
#[derive(Debug)]
pub struct StatusFeed {
    user_id: DbId,
    unread_count: AtomicI64,
    global_hide_status: AtomicBool,
    in_flight: AtomicUsize,
}

/// Decrements the in-flight counter when a refresh finishes or is dropped.
struct Loading<'a>(&'a AtomicUsize);

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StatusFeed {
    pub fn new(user_id: DbId) -> Self {
        Self {
            user_id,
            unread_count: AtomicI64::new(0),
            global_hide_status: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn user_id(&self) -> DbId {
        self.user_id
    }

    pub fn is_status_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            unread_count: self.unread_count.load(Ordering::SeqCst),
            global_hide_status: self.global_hide_status.load(Ordering::SeqCst),
            is_status_loading: self.is_status_loading(),
        }
    }

    /// Re-read both values from the store. On failure the previous values
    /// are kept so the badge degrades to stale rather than empty.
    pub async fn refresh(&self, facade: &ChatSessionFacade) -> Result<StatusSnapshot, CoreError> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let loading = Loading(&self.in_flight);

        let unread = facade.refresh_unread_count(self.user_id).await?;
        let hidden = facade.global_hide_status(self.user_id).await?;
        self.unread_count.store(unread, Ordering::SeqCst);
        self.global_hide_status.store(hidden, Ordering::SeqCst);

        drop(loading);
        Ok(self.snapshot())
    }

    /// Fold a pushed event into the local copy. Returns whether it changed
    /// anything.
    pub fn apply(&self, event: &ChatEvent) -> bool {
        match event {
            ChatEvent::UnreadChanged { unread_count } => {
                self.unread_count.swap(*unread_count, Ordering::SeqCst) != *unread_count
            }
            ChatEvent::StatusChanged { hide_last_seen } => {
                self.global_hide_status.swap(*hide_last_seen, Ordering::SeqCst) != *hide_last_seen
            }
            _ => false,
        }
    }
}
