//! Typing-indicator TTL rules.
//!
//! Entries are never swept; readers drop anything past its expiry.

use chrono::Duration;

use crate::types::Timestamp;

/// Default lifetime of a typing entry in seconds.
pub const DEFAULT_TYPING_TTL_SECS: i64 = 6;

/// Accepted range for a configured typing TTL.
pub const MIN_TYPING_TTL_SECS: i64 = 1;
pub const MAX_TYPING_TTL_SECS: i64 = 60;

/// Expiry for an entry written at `now`.
pub fn typing_expiry(now: Timestamp, ttl: Duration) -> Timestamp {
    now + ttl
}

/// Whether an entry expiring at `expires_at` still counts at `now`.
pub fn is_live(expires_at: Timestamp, now: Timestamp) -> bool {
    expires_at > now
}

/// Validate a configured TTL in seconds.
pub fn validate_typing_ttl(secs: i64) -> Result<(), String> {
    if !(MIN_TYPING_TTL_SECS..=MAX_TYPING_TTL_SECS).contains(&secs) {
        return Err(format!(
            "Typing TTL must be between {MIN_TYPING_TTL_SECS} and {MAX_TYPING_TTL_SECS} seconds, got {secs}"
        ));
    }
    Ok(())
}
