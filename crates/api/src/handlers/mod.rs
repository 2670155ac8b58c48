//! Request handlers.
//!
//! Handlers extract the caller, delegate to [`ChatSessionFacade`] (or a
//! repository for user lookups) and map errors via [`AppError`].
//!
//! [`ChatSessionFacade`]: folio_chat::ChatSessionFacade
//! [`AppError`]: crate::error::AppError

pub mod auth;
pub mod chat;
pub mod presence;
pub mod sessions;
