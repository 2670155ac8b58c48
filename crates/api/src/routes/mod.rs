pub mod chat;
pub mod health;
pub mod presence;
pub mod sessions;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                                   WebSocket push channel
/// /auth/login, /auth/logout             session lifecycle
/// /sessions                             signed-in devices
/// /presence                             online state, last-seen visibility
/// /chat                                 unread badges, typing indicators
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", sessions::auth_router())
        .nest("/sessions", sessions::router())
        .nest("/presence", presence::router())
        .nest("/chat", chat::router())
}
