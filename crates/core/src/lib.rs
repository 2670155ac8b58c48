//! Domain types and rules for sessions, presence and chat-unread tracking.
//!
//! Nothing in here performs I/O; the `folio-db` and `folio-chat` crates build
//! on these rules.

pub mod clock;
pub mod date_label;
pub mod device;
pub mod error;
pub mod events;
pub mod presence;
pub mod session;
pub mod types;
pub mod typing;
pub mod unread;
