#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{TimeZone, Utc};
use folio_api::auth::password::hash_password;
use folio_api::config::ServerConfig;
use folio_api::router::build_app_router;
use folio_api::state::AppState;
use folio_api::ws::WsManager;
use folio_chat::{ChatEventBus, ChatSessionFacade};
use folio_core::clock::ManualClock;
use folio_core::types::{DbId, Timestamp};
use folio_db::models::user::CreateUser;
use folio_db::repositories::UserRepo;
use folio_db::MemoryStore;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

pub const ALICE: DbId = 1;
pub const BOB: DbId = 2;
pub const PASSWORD: &str = "correct-horse-battery-staple";

pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::default()
    }
}

/// The full router over an in-memory store and a manual clock at [`t0`],
/// with `alice` (id 1) and `bob` (id 2) provisioned.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

pub async fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(folio_db::memory_store());
    let clock = Arc::new(ManualClock::new(t0()));
    let event_bus = Arc::new(ChatEventBus::default());
    let facade = Arc::new(ChatSessionFacade::new(
        store.clone(),
        clock.clone(),
        &config.chat,
        event_bus.clone(),
    ));

    let state = AppState {
        store: store.clone(),
        facade,
        config: Arc::new(config.clone()),
        ws_manager: Arc::new(WsManager::new()),
        event_bus,
    };

    seed_user(&store, ALICE, "alice", true).await;
    seed_user(&store, BOB, "bob", true).await;

    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
        store,
        clock,
    }
}

pub async fn seed_user(store: &MemoryStore, id: DbId, username: &str, is_active: bool) {
    let input = CreateUser {
        id,
        username: username.to_string(),
        password_hash: hash_password(PASSWORD).unwrap(),
    };
    UserRepo::create(store, &input, t0()).await.unwrap();
    if !is_active {
        use folio_db::store::{DocumentStore, Update};
        store
            .update(
                folio_db::models::user::COLLECTION,
                &id.to_string(),
                &Update::new().set("is_active", false),
                false,
            )
            .await
            .unwrap();
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> Response {
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: &TestApp, uri: &str, token: &str) -> Response {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &TestApp, uri: &str, body: Value) -> Response {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(app: &TestApp, uri: &str, body: Value, token: &str) -> Response {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_auth(app: &TestApp, uri: &str, token: &str) -> Response {
    let request = Request::post(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: &TestApp, uri: &str, token: &str) -> Response {
    let request = Request::delete(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Log in through the API from a device with `user_agent` and return the
/// full `data` payload.
pub async fn login_from(app: &TestApp, username: &str, user_agent: &str, ip: &str) -> Value {
    let request = Request::post("/api/v1/auth/login")
        .header("content-type", "application/json")
        .header("user-agent", user_agent)
        .header("x-forwarded-for", ip)
        .body(Body::from(
            serde_json::json!({ "username": username, "password": PASSWORD }).to_string(),
        ))
        .unwrap();
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

/// Log in from a desktop browser and return the bearer token.
pub async fn login(app: &TestApp, username: &str) -> String {
    let data = login_from(app, username, CHROME_DESKTOP, "10.0.0.1").await;
    data["token"].as_str().unwrap().to_string()
}
