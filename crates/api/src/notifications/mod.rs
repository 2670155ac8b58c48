//! Delivery of chat events to connected sockets.

mod router;

pub use router::NotificationRouter;
