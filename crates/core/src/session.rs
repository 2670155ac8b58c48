//! Session token generation and lifecycle rules.
//!
//! Tokens are opaque random strings; only their SHA-256 hash is stored so a
//! store leak does not hand out live sessions. A session moves
//! `Active -> Revoked | Expired` and never comes back; the only way in again
//! is a fresh login.

use chrono::Duration;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::AuthFailure;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default session lifetime in days.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

/// Minimum age of `last_active_at` before a validation rewrites it.
pub const DEFAULT_ACTIVITY_REFRESH_SECS: i64 = 300;

/// How long expired sessions are kept before lazy garbage collection.
pub const DEFAULT_EXPIRED_RETENTION_DAYS: i64 = 7;

/// Random bytes per token (rendered as twice as many hex characters).
pub const TOKEN_BYTES: usize = 32;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// A freshly minted session token.
pub struct GeneratedToken {
    /// Returned to the client exactly once, never stored.
    pub plaintext: String,
    /// SHA-256 hex digest of `plaintext`, the only form that is persisted.
    pub hash: String,
}

/// Generate a cryptographically random session token.
pub fn generate_session_token() -> GeneratedToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let plaintext: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    let hash = hash_session_token(&plaintext);
    GeneratedToken { plaintext, hash }
}

/// Hash a presented token for lookup: lowercase SHA-256 hex.
pub fn hash_session_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Cheap shape check so obviously bogus tokens never reach the store.
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Where a stored session sits in its lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Revoked,
    Expired,
}

impl SessionState {
    /// Classify a session. Revocation wins over expiry: a device that was
    /// signed out elsewhere should be told so even after its TTL lapsed.
    pub fn classify(revoked: bool, expires_at: Timestamp, now: Timestamp) -> Self {
        if revoked {
            SessionState::Revoked
        } else if now >= expires_at {
            SessionState::Expired
        } else {
            SessionState::Active
        }
    }

    pub fn is_active(self) -> bool {
        self == SessionState::Active
    }

    /// Map non-active states onto the failure reported to callers.
    pub fn check(self) -> Result<(), AuthFailure> {
        match self {
            SessionState::Active => Ok(()),
            SessionState::Revoked => Err(AuthFailure::Revoked),
            SessionState::Expired => Err(AuthFailure::Expired),
        }
    }
}

/// Whether `last_active_at` is stale enough to be rewritten.
pub fn needs_activity_refresh(
    last_active_at: Timestamp,
    now: Timestamp,
    threshold: Duration,
) -> bool {
    now - last_active_at >= threshold
}
