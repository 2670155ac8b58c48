//! Credential checks performed before a session is issued.

pub mod password;
