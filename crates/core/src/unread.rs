//! Unread-count validation helpers.

use crate::error::CoreError;
use crate::types::DbId;

/// Maximum accepted thread id length.
pub const MAX_THREAD_ID_LENGTH: usize = 128;

/// Thread ids are opaque but must be non-empty and bounded.
pub fn validate_thread_id(thread_id: &str) -> Result<(), CoreError> {
    if thread_id.trim().is_empty() {
        return Err(CoreError::Validation("thread_id must not be empty".to_string()));
    }
    if thread_id.len() > MAX_THREAD_ID_LENGTH {
        return Err(CoreError::Validation(format!(
            "thread_id exceeds maximum length of {MAX_THREAD_ID_LENGTH} characters (got {})",
            thread_id.len()
        )));
    }
    Ok(())
}

/// Reject a stored count below zero.
pub fn check_unread_count(user_id: DbId, thread_id: &str, count: i64) -> Result<i64, CoreError> {
    if count < 0 {
        return Err(CoreError::InvariantViolation(format!(
            "negative unread count {count} for user {user_id} in thread {thread_id}"
        )));
    }
    Ok(count)
}
