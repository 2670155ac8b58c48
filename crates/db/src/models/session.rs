//! Session document and DTOs.

use chrono::serde::ts_milliseconds;
use folio_core::session::SessionState;
use folio_core::types::{DbId, SessionId, Timestamp};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "sessions";

/// One authenticated device/browser, stored in the `sessions` collection.
///
/// Only the SHA-256 hash of the token is kept. NEVER serialize this to API
/// responses directly; use [`SessionResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: DbId,
    pub token_hash: String,
    pub device_label: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: Timestamp,
    #[serde(with = "ts_milliseconds")]
    pub last_active_at: Timestamp,
    #[serde(with = "ts_milliseconds")]
    pub expires_at: Timestamp,
    pub revoked: bool,
}

impl Session {
    pub fn state(&self, now: Timestamp) -> SessionState {
        SessionState::classify(self.revoked, self.expires_at, now)
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        self.state(now).is_active()
    }
}

/// Safe session representation for the "signed-in devices" list.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: SessionId,
    pub device_label: String,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
    pub last_active_at: Timestamp,
    pub expires_at: Timestamp,
    /// Whether this is the session making the request.
    pub current: bool,
}

impl SessionResponse {
    pub fn from_session(session: &Session, current_id: Option<SessionId>) -> Self {
        Self {
            id: session.id,
            device_label: session.device_label.clone(),
            ip_address: session.ip_address.clone(),
            created_at: session.created_at,
            last_active_at: session.last_active_at,
            expires_at: session.expires_at,
            current: current_id == Some(session.id),
        }
    }
}

/// DTO for creating a new session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: DbId,
    pub token_hash: String,
    pub device_label: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}
