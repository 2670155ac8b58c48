//! Caller identity seam.

use folio_core::error::CoreError;
use folio_core::types::DbId;

/// Identifies the caller of a facade operation. Implemented by the transport
/// layer's authenticated context.
pub trait AuthProvider {
    fn current_user_id(&self) -> Option<DbId>;
}

/// The caller's user id, or `Unauthorized` for anonymous callers.
pub fn require_user(provider: &dyn AuthProvider) -> Result<DbId, CoreError> {
    provider
        .current_user_id()
        .ok_or_else(|| CoreError::Unauthorized("Authentication required".into()))
}

impl AuthProvider for Option<DbId> {
    fn current_user_id(&self) -> Option<DbId> {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_unauthorized() {
        let anonymous: Option<DbId> = None;
        assert!(matches!(require_user(&anonymous), Err(CoreError::Unauthorized(_))));
        assert_eq!(require_user(&Some(4)).unwrap(), 4);
    }
}
