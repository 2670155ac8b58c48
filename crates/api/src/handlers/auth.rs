//! Handlers for the `/auth` resource (login, logout).

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use folio_core::device::DeviceMetadata;
use folio_core::error::CoreError;
use folio_core::types::{DbId, Timestamp};
use folio_db::models::session::SessionResponse;
use folio_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};

use crate::auth::password::check_credentials;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login: the bearer token is only ever returned here.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: Timestamp,
    pub session: SessionResponse,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Verify username + password and open a new session for this device.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    let user = UserRepo::find_by_username(state.store.as_ref(), input.username.trim()).await?;

    let verified = check_credentials(user.as_ref(), &input.password);
    let user = user.filter(|_| verified).ok_or_else(|| {
        tracing::info!(username = %input.username, "Login rejected");
        AppError::Core(CoreError::Unauthorized(
            "Invalid username or password".into(),
        ))
    })?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let device = device_metadata(&headers);
    let issued = state.facade.login(user.id, &device).await?;

    Ok(Json(DataResponse {
        data: LoginResponse {
            token: issued.token,
            expires_at: issued.session.expires_at,
            session: SessionResponse::from_session(&issued.session, Some(issued.session.id)),
            user: UserInfo {
                id: user.id,
                username: user.username,
            },
        },
    }))
}

/// POST /api/v1/auth/logout
///
/// Revoke the session the request was made with. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> AppResult<StatusCode> {
    state.facade.logout(&auth.session).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Client metadata from request headers.
///
/// The source address is the first `X-Forwarded-For` hop, falling back to
/// `X-Real-IP`.
pub fn device_metadata(headers: &HeaderMap) -> DeviceMetadata {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let source_ip = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header("x-real-ip"))
        .map(str::to_string);

    DeviceMetadata {
        user_agent: header(USER_AGENT.as_str()).map(str::to_string),
        source_ip,
    }
}
