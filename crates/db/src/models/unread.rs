//! Unread state per (user, thread).

use chrono::serde::ts_milliseconds_option;
use folio_core::types::{DbId, ThreadId, Timestamp};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "unread";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnreadState {
    pub user_id: DbId,
    pub thread_id: ThreadId,
    #[serde(default)]
    pub unread_count: i64,
    #[serde(default, with = "ts_milliseconds_option")]
    pub last_read_at: Option<Timestamp>,
}

/// Document id for the `(user, thread)` pair.
pub fn doc_id(user_id: DbId, thread_id: &str) -> String {
    format!("{user_id}:{thread_id}")
}
