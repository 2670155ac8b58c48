/// Why a session token was not accepted.
///
/// Always surfaced to the caller so the UI can tell "log in again" apart from
/// "this device was signed out elsewhere".
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("Session has expired")]
    Expired,

    #[error("Session was revoked")]
    Revoked,

    #[error("Session not found")]
    NotFound,
}

impl AuthFailure {
    /// Stable machine-readable code for API responses.
    pub fn code(self) -> &'static str {
        match self {
            AuthFailure::Expired => "SESSION_EXPIRED",
            AuthFailure::Revoked => "SESSION_REVOKED",
            AuthFailure::NotFound => "SESSION_NOT_FOUND",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthFailure),

    /// The backing store did not answer in time or refused the call.
    /// Transient; callers may retry with backoff.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Stored state broke an invariant (e.g. a negative unread count).
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable(_))
    }
}
