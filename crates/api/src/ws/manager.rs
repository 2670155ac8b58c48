use std::collections::{BTreeSet, HashMap};

use axum::body::Bytes;
use axum::extract::ws::{close_code, CloseFrame, Message};
use folio_core::events::ChatEvent;
use folio_core::types::{DbId, SessionId};
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// One authenticated socket.
pub struct WsConnection {
    pub user_id: DbId,
    /// Session the socket was opened with; revoking it closes the socket.
    pub session_id: SessionId,
    pub sender: WsSender,
}

/// Policy-violation close frame carrying a machine-readable `reason`, e.g.
/// `SESSION_EXPIRED`.
pub fn policy_close(reason: &'static str) -> Message {
    Message::Close(Some(CloseFrame {
        code: close_code::POLICY,
        reason: reason.into(),
    }))
}

/// Encode a [`ChatEvent`] as a text frame.
pub fn event_message(event: &ChatEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!(kind = event.kind(), error = %e, "Failed to encode chat event");
            None
        }
    }
}

/// Registry of every open socket on this process.
///
/// Thread-safe via interior `RwLock`; shared behind an `Arc`.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection and return the receiver its sender task drains.
    pub async fn add(
        &self,
        conn_id: String,
        user_id: DbId,
        session_id: SessionId,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            session_id,
            sender: tx,
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Distinct sessions with at least one open socket.
    pub async fn session_ids(&self) -> BTreeSet<SessionId> {
        self.connections
            .read()
            .await
            .values()
            .map(|conn| conn.session_id)
            .collect()
    }

    /// Send to every connection. Closed channels are skipped; their owners
    /// clean up on the next receive.
    pub async fn broadcast(&self, message: Message) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(message.clone());
        }
    }

    /// Send to every connection of `user_id`. Returns how many were reached.
    pub async fn send_to_user(&self, user_id: DbId, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values().filter(|c| c.user_id == user_id) {
            if conn.sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Send to a single connection.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        self.connections
            .read()
            .await
            .get(conn_id)
            .is_some_and(|conn| conn.sender.send(message).is_ok())
    }

    /// Close and forget every connection opened with `session_id`, telling
    /// the client why. Returns how many were closed.
    pub async fn close_session(&self, session_id: SessionId, reason: &'static str) -> usize {
        let mut conns = self.connections.write().await;
        let before = conns.len();
        conns.retain(|_, conn| {
            if conn.session_id != session_id {
                return true;
            }
            let _ = conn.sender.send(policy_close(reason));
            false
        });
        before - conns.len()
    }

    /// Close and forget one connection, telling the client why.
    pub async fn close(&self, conn_id: &str, reason: &'static str) -> bool {
        match self.connections.write().await.remove(conn_id) {
            Some(conn) => conn.sender.send(policy_close(reason)).is_ok(),
            None => false,
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connection.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
