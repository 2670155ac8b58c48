//! Typed documents.
//!
//! Each submodule contains:
//! - A `Serialize` + `Deserialize` document struct with its collection name
//! - A create DTO where the document is inserted rather than upserted
//!
//! Timestamps are stored as UTC milliseconds so the store's `max` operator
//! and range filters compare them numerically.

pub mod presence;
pub mod session;
pub mod typing;
pub mod unread;
pub mod user;

use folio_core::types::Timestamp;

/// Millisecond representation used inside documents.
pub fn millis(ts: Timestamp) -> i64 {
    ts.timestamp_millis()
}
