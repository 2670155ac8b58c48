//! Unread badges and typing indicators through `/api/v1/chat`.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::*;
use serde_json::json;

const THREAD: &str = "thread-1";

// ---------------------------------------------------------------------------
// Test: a message increments every recipient except the author
// ---------------------------------------------------------------------------

#[tokio::test]
async fn message_counts_for_recipients_not_author() {
    let app = build_test_app().await;
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;

    let response = post_json_auth(
        &app,
        &format!("/api/v1/chat/threads/{THREAD}/messages"),
        json!({ "recipient_ids": [ALICE, BOB, BOB] }),
        &alice,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["notified"], json!([BOB]));

    let json = body_json(get_auth(&app, "/api/v1/chat/unread", &bob).await).await;
    assert_eq!(json["data"]["unread_count"], 1);

    let json = body_json(get_auth(&app, "/api/v1/chat/unread", &alice).await).await;
    assert_eq!(json["data"]["unread_count"], 0);
}

// ---------------------------------------------------------------------------
// Test: mark read resets one thread and returns the new total
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mark_read_resets_thread() {
    let app = build_test_app().await;
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;

    for thread in [THREAD, THREAD, "thread-2"] {
        post_json_auth(
            &app,
            &format!("/api/v1/chat/threads/{thread}/messages"),
            json!({ "recipient_ids": [BOB] }),
            &alice,
        )
        .await;
    }

    let json = body_json(get_auth(&app, "/api/v1/chat/status", &bob).await).await;
    assert_eq!(json["data"]["unread_count"], 3);
    assert_eq!(json["data"]["global_hide_status"], false);
    assert_eq!(json["data"]["is_status_loading"], false);

    let response = post_auth(&app, &format!("/api/v1/chat/threads/{THREAD}/read"), &bob).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["unread_count"], 1);

    let response = post_auth(&app, &format!("/api/v1/chat/threads/{THREAD}/read"), &bob).await;
    assert_eq!(body_json(response).await["data"]["unread_count"], 1);
}

// ---------------------------------------------------------------------------
// Test: invalid thread ids are rejected
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blank_thread_id_is_a_validation_error() {
    let app = build_test_app().await;
    let bob = login(&app, "bob").await;

    let response = post_auth(&app, "/api/v1/chat/threads/%20/read", &bob).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Test: typing indicators exclude the caller and expire
// ---------------------------------------------------------------------------

#[tokio::test]
async fn typing_is_visible_to_others_until_it_expires() {
    let app = build_test_app().await;
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;
    let uri = format!("/api/v1/chat/threads/{THREAD}/typing");

    let response = post_auth(&app, &uri, &alice).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["expires_at"].is_string());

    let json = body_json(get_auth(&app, &uri, &bob).await).await;
    assert_eq!(json["data"]["user_ids"], json!([ALICE]));

    let json = body_json(get_auth(&app, &uri, &alice).await).await;
    assert_eq!(json["data"]["user_ids"], json!([]));

    app.clock.advance(app.state.config.chat.typing_ttl + Duration::seconds(1));
    let json = body_json(get_auth(&app, &uri, &bob).await).await;
    assert_eq!(json["data"]["user_ids"], json!([]));
}

#[tokio::test]
async fn sending_a_message_clears_author_typing() {
    let app = build_test_app().await;
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;
    let uri = format!("/api/v1/chat/threads/{THREAD}/typing");

    post_auth(&app, &uri, &alice).await;
    post_json_auth(
        &app,
        &format!("/api/v1/chat/threads/{THREAD}/messages"),
        json!({ "recipient_ids": [BOB] }),
        &alice,
    )
    .await;

    let json = body_json(get_auth(&app, &uri, &bob).await).await;
    assert_eq!(json["data"]["user_ids"], json!([]));
}

// ---------------------------------------------------------------------------
// Test: an unreachable store surfaces as 503
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_outage_is_service_unavailable() {
    let app = build_test_app().await;
    let bob = login(&app, "bob").await;

    app.store.set_unavailable(true);
    let response = get_auth(&app, "/api/v1/chat/unread", &bob).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "STORE_UNAVAILABLE");
}

// ---------------------------------------------------------------------------
// Test: HTTP actions push unread totals to the recipient's sockets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn message_pushes_unread_total_to_recipient_sockets() {
    use axum::extract::ws::Message;
    use folio_api::notifications::NotificationRouter;
    use folio_core::events::ChatEvent;

    let app = build_test_app().await;
    let alice = login(&app, "alice").await;
    let _bob = login(&app, "bob").await;

    let router = NotificationRouter::new(app.state.ws_manager.clone());
    let handle = tokio::spawn(router.run(app.state.event_bus.subscribe()));
    let mut bob_socket = app
        .state
        .ws_manager
        .add("bob-phone".into(), BOB, uuid::Uuid::now_v7())
        .await;

    post_json_auth(
        &app,
        &format!("/api/v1/chat/threads/{THREAD}/messages"),
        json!({ "recipient_ids": [BOB] }),
        &alice,
    )
    .await;

    let pushed = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            match bob_socket.recv().await {
                Some(Message::Text(text)) => {
                    let event: ChatEvent = serde_json::from_str(text.as_str()).unwrap();
                    if let ChatEvent::UnreadChanged { .. } = event {
                        return event;
                    }
                }
                other => panic!("unexpected frame {other:?}"),
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(pushed, ChatEvent::UnreadChanged { unread_count: 1 });
    handle.abort();
}
