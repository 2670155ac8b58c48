//! Session-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use folio_chat::AuthProvider;
use folio_core::error::CoreError;
use folio_core::types::DbId;
use folio_db::models::session::Session;

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller extracted from a `Bearer` session token in the
/// `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    /// The validated session the token belongs to.
    pub session: Session,
}

impl AuthProvider for AuthUser {
    fn current_user_id(&self) -> Option<DbId> {
        Some(self.user_id)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing Authorization header".into()))
        })?;

    header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        ))
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let session = state.facade.authenticate(token).await?;

        Ok(AuthUser {
            user_id: session.user_id,
            session,
        })
    }
}
