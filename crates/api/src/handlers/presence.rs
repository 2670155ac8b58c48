//! Handlers for the `/presence` resource.

use axum::extract::{Path, State};
use axum::Json;
use folio_core::presence::PresenceView;
use folio_core::types::DbId;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HideStatusResponse {
    pub hide_last_seen: bool,
}

/// GET /api/v1/presence/{user_id}
///
/// Presence of `user_id` as the caller may see it; `last_seen_at` is null
/// when the target hides it from others.
pub async fn get_presence(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<PresenceView>>> {
    let view = state.facade.get_presence(user_id, Some(auth.user_id)).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/presence/status/toggle
pub async fn toggle_status(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<HideStatusResponse>>> {
    let hide_last_seen = state.facade.toggle_global_status(auth.user_id).await?;
    Ok(Json(DataResponse {
        data: HideStatusResponse { hide_last_seen },
    }))
}
