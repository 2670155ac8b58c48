//! Sessions, presence, unread counters and typing indicators.
//!
//! [`ChatSessionFacade`] is the entry point; the components behind it each
//! own one document collection and treat the shared store as the only source
//! of truth.

pub mod auth;
pub mod config;
pub mod events;
pub mod facade;
pub mod guard;
pub mod presence;
pub mod session_store;
pub mod status;
pub mod typing;
pub mod unread;

pub use auth::{require_user, AuthProvider};
pub use config::ChatConfig;
pub use events::{Audience, ChatEventBus, Delivery};
pub use facade::ChatSessionFacade;
pub use session_store::{Authenticated, IssuedSession, SessionStore};
pub use status::{StatusFeed, StatusSnapshot};
