//! User document and DTOs.

use chrono::serde::ts_milliseconds;
use folio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "users";

/// Login identity. Contains the password hash -- NEVER serialize this to API
/// responses directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    #[serde(with = "ts_milliseconds")]
    pub created_at: Timestamp,
}

/// DTO for provisioning a user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub id: DbId,
    pub username: String,
    pub password_hash: String,
}
