use std::sync::Arc;

use folio_chat::{ChatEventBus, ChatSessionFacade};
use folio_db::SharedStore;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Document store (Postgres or in-memory).
    pub store: SharedStore,
    /// Sessions, presence, unread and typing.
    pub facade: Arc<ChatSessionFacade>,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Chat events awaiting delivery to sockets.
    pub event_bus: Arc<ChatEventBus>,
}
