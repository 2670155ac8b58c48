//! In-process state for socket unit tests: memory store, manual clock, no
//! HTTP server.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use folio_chat::{ChatEventBus, ChatSessionFacade, IssuedSession};
use folio_core::clock::ManualClock;
use folio_core::device::DeviceMetadata;
use folio_core::types::DbId;
use folio_db::MemoryStore;

use crate::config::ServerConfig;
use crate::state::AppState;
use crate::ws::WsManager;

pub const ALICE: DbId = 1;
pub const BOB: DbId = 2;

pub struct Fixture {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(folio_db::memory_store());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()));
        let config = ServerConfig::default();
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
            config: Arc::new(config),
            ws_manager: Arc::new(WsManager::new()),
            event_bus,
        };
        Self { state, store, clock }
    }

    pub async fn login(&self, user_id: DbId) -> IssuedSession {
        let device = DeviceMetadata::new("Mozilla/5.0 (X11; Linux x86_64) Firefox/125.0", "10.0.0.9");
        self.state.facade.login(user_id, &device).await.unwrap()
    }
}
