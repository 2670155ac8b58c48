//! Presence document.

use chrono::serde::ts_milliseconds_option;
use folio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "presence";

/// Per-user presence record. Created lazily on the first session and never
/// deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presence {
    pub user_id: DbId,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default, with = "ts_milliseconds_option")]
    pub last_seen_at: Option<Timestamp>,
    #[serde(default)]
    pub hide_last_seen: bool,
}

impl Presence {
    /// The record a user has before any presence write.
    pub fn offline(user_id: DbId) -> Self {
        Self {
            user_id,
            is_online: false,
            last_seen_at: None,
            hide_last_seen: false,
        }
    }
}
