//! Handlers for the `/sessions` resource: a user's signed-in devices.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use folio_core::types::SessionId;
use folio_db::models::session::SessionResponse;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RevokeAllResponse {
    pub revoked: usize,
}

/// GET /api/v1/sessions
///
/// Active sessions of the caller, newest first. The session making the
/// request is flagged `current`.
pub async fn list_sessions(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<SessionResponse>>>> {
    let sessions = state.facade.list_sessions(auth.user_id).await?;
    let data = sessions
        .iter()
        .map(|s| SessionResponse::from_session(s, Some(auth.session.id)))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/sessions/{id}
///
/// Sign out one of the caller's devices. Idempotent.
pub async fn revoke_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> AppResult<StatusCode> {
    state.facade.revoke_session(auth.user_id, session_id).await?;
    tracing::info!(user_id = auth.user_id, %session_id, "Session revoked by user");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/revoke-all
///
/// Sign out every device of the caller, including this one.
pub async fn revoke_all(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<RevokeAllResponse>>> {
    let revoked = state.facade.revoke_all(auth.user_id).await?;
    tracing::info!(user_id = auth.user_id, revoked, "All sessions revoked by user");
    Ok(Json(DataResponse {
        data: RevokeAllResponse { revoked },
    }))
}
