//! Typing indicator entries.

use chrono::serde::ts_milliseconds;
use folio_core::types::{DbId, ThreadId, Timestamp};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "typing";

/// Advisory "is typing" marker, treated as absent once `expires_at` passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingEntry {
    pub thread_id: ThreadId,
    pub user_id: DbId,
    #[serde(with = "ts_milliseconds")]
    pub expires_at: Timestamp,
}

pub fn doc_id(thread_id: &str, user_id: DbId) -> String {
    format!("{thread_id}:{user_id}")
}
