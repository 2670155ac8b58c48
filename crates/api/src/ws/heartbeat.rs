//! Periodic keep-alive and session sweep for open sockets.
//!
//! A socket outlives the request that authenticated it. Each tick pings every
//! connection and closes those whose session has since expired or been
//! revoked, including revocations made by another API instance that this
//! process never saw on its event bus.

use std::sync::Arc;
use std::time::Duration;

use folio_chat::ChatSessionFacade;
use folio_core::error::CoreError;

use crate::ws::manager::WsManager;

/// Spawn the heartbeat task, ticking every `period`. Runs until aborted
/// through the returned handle.
pub fn start_heartbeat(
    ws_manager: Arc<WsManager>,
    facade: Arc<ChatSessionFacade>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;
            ws_manager.ping_all().await;
            let closed = close_lapsed_sessions(&ws_manager, &facade).await;
            let connections = ws_manager.connection_count().await;
            tracing::debug!(
                connections,
                closed,
                "WebSocket heartbeat"
            );
        }
    })
}

/// Close every socket whose session is no longer active. Returns how many
/// sockets were closed.
///
/// A session that cannot be checked because the store is down keeps its
/// sockets until a later tick; every command on them re-authenticates anyway.
pub async fn close_lapsed_sessions(ws_manager: &WsManager, facade: &ChatSessionFacade) -> usize {
    let mut closed = 0;
    for session_id in ws_manager.session_ids().await {
        match facade.check_session(session_id).await {
            Ok(()) => {}
            Err(CoreError::Auth(failure)) => {
                let n = ws_manager.close_session(session_id, failure.code()).await;
                tracing::info!(%session_id, reason = failure.code(), closed = n, "Closed sockets of lapsed session");
                closed += n;
            }
            Err(e) => {
                tracing::warn!(%session_id, error = %e, "Session check failed during heartbeat");
            }
        }
    }
    closed
}
