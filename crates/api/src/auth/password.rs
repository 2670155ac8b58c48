//! Argon2id password hashing and login verification.
//!
//! Hashes are stored in PHC string format on the `users` document, so the
//! algorithm parameters and salt travel with the hash.

use std::sync::LazyLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use folio_db::models::user::User;

/// Hash compared against when the username does not exist, so unknown and
/// known usernames cost the same amount of work.
static DECOY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("folio-decoy-password").ok());

/// Hash a plaintext password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch; `Err` only for a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Check a login attempt against an optional user record.
///
/// A missing user still runs one verification against [`DECOY_HASH`]. A
/// malformed stored hash is logged and treated as a mismatch.
pub fn check_credentials(user: Option<&User>, password: &str) -> bool {
    match user {
        Some(user) => verify_password(password, &user.password_hash).unwrap_or_else(|e| {
            tracing::error!(user_id = user.id, error = %e, "Stored password hash is malformed");
            false
        }),
        None => {
            if let Some(decoy) = DECOY_HASH.as_deref() {
                let _ = verify_password(password, decoy);
            }
            false
        }
    }
}
