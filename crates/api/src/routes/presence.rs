use axum::routing::{get, post};
use axum::Router;

use crate::handlers::presence;
use crate::state::AppState;

/// Routes mounted at `/presence`.
///
/// ```text
/// GET  /{user_id}        -> get_presence
/// POST /status/toggle    -> toggle_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{user_id}", get(presence::get_presence))
        .route("/status/toggle", post(presence::toggle_status))
}
