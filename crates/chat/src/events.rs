//! In-process fan-out of [`ChatEvent`]s to connected clients.

use folio_core::events::ChatEvent;
use folio_core::types::DbId;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Who should receive an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every connection of one user.
    User(DbId),
    /// Every connection.
    Everyone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub audience: Audience,
    pub event: ChatEvent,
}

/// Publish/subscribe hub between the facade and the transport layer.
///
/// When the buffer is full, the oldest undelivered messages are dropped and
/// slow receivers observe `RecvError::Lagged`.
pub struct ChatEventBus {
    sender: broadcast::Sender<Delivery>,
}

impl ChatEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently when nobody
    /// is subscribed.
    pub fn publish(&self, audience: Audience, event: ChatEvent) {
        tracing::debug!(kind = event.kind(), ?audience, "Publishing chat event");
        let _ = self.sender.send(Delivery { audience, event });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Delivery> {
        self.sender.subscribe()
    }
}

impl Default for ChatEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
