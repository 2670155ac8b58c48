//! Session lifecycle routes: signing in and out, and managing the other
//! signed-in devices.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{auth, sessions};
use crate::state::AppState;

/// Routes mounted at `/auth`. Login is the only unauthenticated API route
/// besides the socket upgrade.
///
/// ```text
/// POST /login    -> login
/// POST /logout   -> logout (revokes the calling session)
/// ```
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Routes mounted at `/sessions`.
///
/// ```text
/// GET    /             -> list_sessions
/// DELETE /{id}         -> revoke_session
/// POST   /revoke-all   -> revoke_all
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sessions::list_sessions))
        .route("/{id}", delete(sessions::revoke_session))
        .route("/revoke-all", post(sessions::revoke_all))
}
