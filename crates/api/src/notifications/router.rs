//! Event-to-socket routing.
//!
//! [`NotificationRouter`] subscribes to the [`ChatEventBus`] and forwards each
//! delivery to the sockets of its audience.
//!
//! [`ChatEventBus`]: folio_chat::ChatEventBus

use std::sync::Arc;

use folio_chat::{Audience, Delivery};
use folio_core::error::AuthFailure;
use folio_core::events::ChatEvent;
use tokio::sync::broadcast;

use crate::ws::manager::event_message;
use crate::ws::WsManager;

pub struct NotificationRouter {
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the routing loop until the event bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<Delivery>) {
        loop {
            match receiver.recv().await {
                Ok(delivery) => self.route(&delivery).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one event. A revoked session's sockets receive the event and
    /// are then closed.
    pub async fn route(&self, delivery: &Delivery) {
        let Some(message) = event_message(&delivery.event) else {
            return;
        };

        match delivery.audience {
            Audience::User(user_id) => {
                let reached = self.ws_manager.send_to_user(user_id, message).await;
                tracing::debug!(user_id, reached, kind = delivery.event.kind(), "Routed chat event");
            }
            Audience::Everyone => self.ws_manager.broadcast(message).await,
        }

        if let ChatEvent::SessionRevoked { session_id } = delivery.event {
            let closed = self
                .ws_manager
                .close_session(session_id, AuthFailure::Revoked.code())
                .await;
            if closed > 0 {
                tracing::info!(%session_id, closed, "Closed sockets of revoked session");
            }
        }
    }
}
