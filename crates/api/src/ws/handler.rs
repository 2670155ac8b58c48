use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use folio_chat::StatusFeed;
use folio_core::error::{AuthFailure, CoreError};
use folio_core::events::{ChatEvent, ClientCommand};
use folio_db::models::session::Session;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::error::AppResult;
use crate::state::AppState;
use crate::ws::manager::event_message;

/// How long queued frames (a final close included) may take to flush after
/// the receive loop ends.
const SEND_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Session token; browsers cannot set headers on the upgrade request.
    pub token: String,
}

/// GET /api/v1/ws?token=...
///
/// Authenticates the token before upgrading, so a bad token gets a normal
/// JSON error response instead of a socket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let session = state.facade.authenticate(&query.token).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, session, query.token)))
}

/// Manage one socket after upgrade.
///
/// 1. Registers the connection with `WsManager`.
/// 2. Spawns a sender task that forwards queued frames to the sink and keeps
///    the connection's [`StatusFeed`] in step with pushed events.
/// 3. Sends the initial status snapshot.
/// 4. Dispatches inbound [`ClientCommand`]s until the client goes away or
///    the session stops authenticating.
async fn handle_socket(socket: WebSocket, state: AppState, session: Session, token: String) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let user_id = session.user_id;
    tracing::info!(conn_id = %conn_id, user_id, session_id = %session.id, "WebSocket connected");

    let mut rx = state.ws_manager.add(conn_id.clone(), user_id, session.id).await;
    let feed = Arc::new(StatusFeed::new(user_id));

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let sender_feed = Arc::clone(&feed);
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Message::Text(text) = &msg {
                if let Ok(event) = serde_json::from_str::<ChatEvent>(text.as_str()) {
                    sender_feed.apply(&event);
                }
            }
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() || closing {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    send_status(&state, &conn_id, &feed).await;

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientCommand>(text.as_str()) {
                Ok(command) => match dispatch(&state, &conn_id, &token, &feed, command).await {
                    Ok(()) => {}
                    Err(CoreError::Auth(failure)) => {
                        reject(&state, &conn_id, failure).await;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(conn_id = %conn_id, user_id, error = %e, "WebSocket command failed");
                    }
                },
                Err(e) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "Ignoring malformed WebSocket command");
                }
            },
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Dropping the registry entry ends the sender task once its queue drains.
    state.ws_manager.remove(&conn_id).await;
    let abort = send_task.abort_handle();
    if tokio::time::timeout(SEND_DRAIN_TIMEOUT, send_task).await.is_err() {
        abort.abort();
    }
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket disconnected");
}

/// Run one command as the session behind `token`. The token is validated
/// again on every command, so a socket stops acting the moment its session
/// expires or is revoked anywhere.
async fn dispatch(
    state: &AppState,
    conn_id: &str,
    token: &str,
    feed: &StatusFeed,
    command: ClientCommand,
) -> Result<(), CoreError> {
    let session = state.facade.authenticate(token).await?;
    match command {
        ClientCommand::Typing { thread_id } => {
            state.facade.typing(&thread_id, session.user_id).await?;
        }
        // The new total reaches this socket through the event bus.
        ClientCommand::MarkRead { thread_id } => {
            state.facade.mark_read(session.user_id, &thread_id).await?;
        }
        ClientCommand::StatusRefresh => send_status(state, conn_id, feed).await,
    }
    Ok(())
}

/// Tell the client why its session no longer works and close the socket.
async fn reject(state: &AppState, conn_id: &str, failure: AuthFailure) {
    tracing::info!(conn_id, reason = failure.code(), "Closing WebSocket of lapsed session");
    state.ws_manager.close(conn_id, failure.code()).await;
}

/// Refresh `feed` from the store and push the snapshot to this connection.
/// On failure the last known state is sent instead.
async fn send_status(state: &AppState, conn_id: &str, feed: &StatusFeed) {
    let snapshot = match feed.refresh(&state.facade).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(conn_id, user_id = feed.user_id(), error = %e, "Status refresh failed");
            feed.snapshot()
        }
    };
    if let Some(message) = event_message(&ChatEvent::from(snapshot)) {
        state.ws_manager.send_to(conn_id, message).await;
    }
}
