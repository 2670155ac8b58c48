//! Real-time message protocol pushed to, and accepted from, client sockets.
//!
//! Serialized as JSON with an internally-tagged `"type"` discriminator so the
//! frontend can route messages by type string.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, SessionId, ThreadId, Timestamp};

/// Server -> client events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ChatEvent {
    /// A user went online or offline. `last_seen_at` is the public view and
    /// is `null` when the user hides it.
    #[serde(rename = "presence.changed")]
    PresenceChanged {
        user_id: DbId,
        is_online: bool,
        last_seen_at: Option<Timestamp>,
    },

    /// The recipient's total unread count changed.
    #[serde(rename = "unread.changed")]
    UnreadChanged { unread_count: i64 },

    /// The recipient toggled their last-seen visibility on another device.
    #[serde(rename = "status.changed")]
    StatusChanged { hide_last_seen: bool },

    /// One of the recipient's sessions was signed out.
    #[serde(rename = "session.revoked")]
    SessionRevoked { session_id: SessionId },

    /// Badge state for a single connection.
    #[serde(rename = "status.snapshot")]
    StatusSnapshot {
        unread_count: i64,
        global_hide_status: bool,
        is_status_loading: bool,
    },
}

impl ChatEvent {
    /// The `"type"` discriminator, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::PresenceChanged { .. } => "presence.changed",
            ChatEvent::UnreadChanged { .. } => "unread.changed",
            ChatEvent::StatusChanged { .. } => "status.changed",
            ChatEvent::SessionRevoked { .. } => "session.revoked",
            ChatEvent::StatusSnapshot { .. } => "status.snapshot",
        }
    }
}

/// Client -> server commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClientCommand {
    #[serde(rename = "typing")]
    Typing { thread_id: ThreadId },

    #[serde(rename = "mark_read")]
    MarkRead { thread_id: ThreadId },

    #[serde(rename = "status.refresh")]
    StatusRefresh,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_event_uses_type_tag() {
        let event = ChatEvent::PresenceChanged {
            user_id: 7,
            is_online: false,
            last_seen_at: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "presence.changed");
        assert_eq!(json["user_id"], 7);
        assert!(json["last_seen_at"].is_null());
        assert_eq!(event.kind(), "presence.changed");
    }

    #[test]
    fn client_commands_parse() {
        let cmd: ClientCommand =
            serde_json::from_str(r#"{"type":"typing","thread_id":"abc"}"#).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::Typing {
                thread_id: "abc".to_string()
            }
        );

        let cmd: ClientCommand = serde_json::from_str(r#"{"type":"status.refresh"}"#).unwrap();
        assert_eq!(cmd, ClientCommand::StatusRefresh);
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(serde_json::from_str::<ClientCommand>(r#"{"type":"dance"}"#).is_err());
    }
}
