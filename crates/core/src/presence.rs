//! Presence visibility and transition rules.
//!
//! A user is online exactly while they hold at least one active session.
//! `hide_last_seen` only conceals the timestamp, never the online flag, and
//! never from the owner themself.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// Presence as seen by one particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceView {
    pub user_id: DbId,
    pub is_online: bool,
    pub last_seen_at: Option<Timestamp>,
}

/// The timestamp a viewer is allowed to see.
pub fn visible_last_seen(
    owner_id: DbId,
    viewer_id: Option<DbId>,
    hide_last_seen: bool,
    last_seen_at: Option<Timestamp>,
) -> Option<Timestamp> {
    if hide_last_seen && viewer_id != Some(owner_id) {
        None
    } else {
        last_seen_at
    }
}

/// Outcome of a presence write: the online flag before and after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceChange {
    pub was_online: bool,
    pub is_online: bool,
}

impl PresenceChange {
    pub fn new(was_online: bool, is_online: bool) -> Self {
        Self {
            was_online,
            is_online,
        }
    }

    /// Whether the write moved the user between `Offline` and `Online`.
    pub fn flipped(&self) -> bool {
        self.was_online != self.is_online
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn owner_always_sees_last_seen() {
        let ts = Some(Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap());
        assert_eq!(visible_last_seen(1, Some(1), true, ts), ts);
        assert_eq!(visible_last_seen(1, Some(1), false, ts), ts);
    }

    #[test]
    fn hidden_last_seen_is_concealed_from_others() {
        let ts = Some(Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap());
        assert_eq!(visible_last_seen(1, Some(2), true, ts), None);
        assert_eq!(visible_last_seen(1, None, true, ts), None);
        assert_eq!(visible_last_seen(1, Some(2), false, ts), ts);
    }

    #[test]
    fn change_detects_flips() {
        assert!(PresenceChange::new(false, true).flipped());
        assert!(PresenceChange::new(true, false).flipped());
        assert!(!PresenceChange::new(true, true).flipped());
    }
}
