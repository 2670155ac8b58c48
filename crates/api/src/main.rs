use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use folio_chat::{ChatEventBus, ChatSessionFacade};
use folio_core::clock::{Clock, SystemClock};
use folio_db::models::user::CreateUser;
use folio_db::repositories::UserRepo;
use folio_db::{PgStore, SharedStore, StoreError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_api::auth::password::hash_password;
use folio_api::config::ServerConfig;
use folio_api::notifications::NotificationRouter;
use folio_api::router::build_app_router;
use folio_api::state::AppState;
use folio_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_api=debug,folio_chat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Store ---
    let store = open_store().await;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    seed_user(&store, clock.as_ref()).await;

    // --- Event bus + facade ---
    let event_bus = Arc::new(ChatEventBus::default());
    let facade = Arc::new(ChatSessionFacade::new(
        store.clone(),
        clock,
        &config.chat,
        Arc::clone(&event_bus),
    ));

    // --- WebSocket manager + heartbeat ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(
        Arc::clone(&ws_manager),
        Arc::clone(&facade),
        Duration::from_secs(config.heartbeat_secs),
    );

    let notification_router = NotificationRouter::new(Arc::clone(&ws_manager));
    let router_handle = tokio::spawn(notification_router.run(event_bus.subscribe()));
    tracing::info!("Notification router started");

    // --- App state ---
    let state = AppState {
        store,
        facade,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        event_bus,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;
    heartbeat_handle.abort();

    // The router exits once every bus sender (state clones included) is gone.
    let router_abort = router_handle.abort_handle();
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(shutdown_timeout, router_handle).await.is_err() {
        tracing::warn!("Notification router did not stop in time");
        router_abort.abort();
    }

    tracing::info!("Graceful shutdown complete");
}

/// Postgres when `DATABASE_URL` is set, otherwise the in-memory store.
async fn open_store() -> SharedStore {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        tracing::warn!("DATABASE_URL not set, using in-memory store (state is lost on restart)");
        return Arc::new(folio_db::memory_store());
    };

    let pool = folio_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    folio_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    folio_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    Arc::new(PgStore::new(pool))
}

/// Provision a login from `SEED_USERNAME` / `SEED_PASSWORD` (id from
/// `SEED_USER_ID`, default `1`) for local development. No-op when unset.
async fn seed_user(store: &SharedStore, clock: &dyn Clock) {
    let (Ok(username), Ok(password)) = (
        std::env::var("SEED_USERNAME"),
        std::env::var("SEED_PASSWORD"),
    ) else {
        return;
    };
    let id = std::env::var("SEED_USER_ID")
        .unwrap_or_else(|_| "1".into())
        .parse()
        .expect("SEED_USER_ID must be a valid i64");

    let input = CreateUser {
        id,
        username,
        password_hash: hash_password(&password).expect("Failed to hash seed password"),
    };
    match UserRepo::create(store.as_ref(), &input, clock.now()).await {
        Ok(user) => tracing::info!(user_id = user.id, username = %user.username, "Seed user created"),
        Err(StoreError::Conflict { .. }) => {
            tracing::debug!(username = %input.username, "Seed user already exists");
        }
        Err(e) => panic!("Failed to create seed user: {e}"),
    }
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
