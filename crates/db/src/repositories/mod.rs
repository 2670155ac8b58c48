//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&dyn DocumentStore` as the first argument. Every mutation is a single
//! atomic document operation; nothing here reads, modifies and writes back a
//! whole document.

pub mod presence_repo;
pub mod session_repo;
pub mod typing_repo;
pub mod unread_repo;
pub mod user_repo;

pub use presence_repo::PresenceRepo;
pub use session_repo::{RevokeResult, SessionRepo};
pub use typing_repo::TypingRepo;
pub use unread_repo::UnreadRepo;
pub use user_repo::UserRepo;
