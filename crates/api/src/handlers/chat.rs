//! Handlers for the `/chat` resource: unread badges and typing indicators.
//!
//! Thread ids come from the messaging transport and are validated by the
//! facade.

use std::collections::BTreeSet;

use axum::extract::{Path, State};
use axum::Json;
use folio_chat::{require_user, StatusSnapshot};
use folio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /chat/threads/{id}/messages`.
#[derive(Debug, Deserialize)]
pub struct MessageEvent {
    pub recipient_ids: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Recipients whose unread count was incremented.
    pub notified: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct TypingResponse {
    pub expires_at: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct TypingUsersResponse {
    pub user_ids: BTreeSet<DbId>,
}

// ---------------------------------------------------------------------------
// Status / unread
// ---------------------------------------------------------------------------

/// GET /api/v1/chat/status
pub async fn status(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<StatusSnapshot>>> {
    let snapshot = state.facade.status(auth.user_id).await?;
    Ok(Json(DataResponse { data: snapshot }))
}

/// GET /api/v1/chat/unread
///
/// Total unread count, read through to the store.
pub async fn unread(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadResponse>>> {
    let unread_count = state.facade.refresh_unread_count(auth.user_id).await?;
    Ok(Json(DataResponse {
        data: UnreadResponse { unread_count },
    }))
}

/// POST /api/v1/chat/threads/{id}/messages
///
/// Record that the caller sent a message to `recipient_ids` in this thread.
pub async fn message(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(input): Json<MessageEvent>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    let author_id = require_user(&auth)?;
    let notified = state
        .facade
        .on_message(&thread_id, author_id, &input.recipient_ids)
        .await?;
    Ok(Json(DataResponse {
        data: MessageResponse { notified },
    }))
}

/// POST /api/v1/chat/threads/{id}/read
///
/// Returns the caller's new total unread count.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> AppResult<Json<DataResponse<UnreadResponse>>> {
    let unread_count = state.facade.mark_read(auth.user_id, &thread_id).await?;
    Ok(Json(DataResponse {
        data: UnreadResponse { unread_count },
    }))
}

// ---------------------------------------------------------------------------
// Typing
// ---------------------------------------------------------------------------

/// POST /api/v1/chat/threads/{id}/typing
pub async fn typing(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> AppResult<Json<DataResponse<TypingResponse>>> {
    let expires_at = state.facade.typing(&thread_id, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: TypingResponse { expires_at },
    }))
}

/// GET /api/v1/chat/threads/{id}/typing
///
/// Users currently typing in the thread, excluding the caller.
pub async fn typing_users(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> AppResult<Json<DataResponse<TypingUsersResponse>>> {
    let user_ids = state.facade.is_typing(&thread_id, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: TypingUsersResponse { user_ids },
    }))
}
