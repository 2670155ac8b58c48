//! WebSocket push channel: connection registry, heartbeat and the upgrade
//! handler.

mod handler;
mod heartbeat;
pub mod manager;
#[cfg(test)]
mod test_support;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
