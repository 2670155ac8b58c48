//! Route definitions for the `/chat` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::chat;
use crate::state::AppState;

/// Routes mounted at `/chat`.
///
/// ```text
/// GET  /status                      -> status
/// GET  /unread                      -> unread
/// POST /threads/{id}/messages       -> message
/// POST /threads/{id}/read           -> mark_read
/// POST /threads/{id}/typing         -> typing
/// GET  /threads/{id}/typing         -> typing_users
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(chat::status))
        .route("/unread", get(chat::unread))
        .route("/threads/{id}/messages", post(chat::message))
        .route("/threads/{id}/read", post(chat::mark_read))
        .route(
            "/threads/{id}/typing",
            post(chat::typing).get(chat::typing_users),
        )
}
