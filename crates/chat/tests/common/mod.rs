#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{TimeZone, Utc};
use folio_chat::{ChatConfig, ChatEventBus, ChatSessionFacade, IssuedSession};
use folio_core::clock::ManualClock;
use folio_core::device::DeviceMetadata;
use folio_core::types::{DbId, Timestamp};
use folio_db::MemoryStore;

pub const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

pub const ALICE: DbId = 1;
pub const BOB: DbId = 2;
pub const CAROL: DbId = 3;

pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// A facade over a fresh in-memory store and a manual clock at [`t0`].
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub events: Arc<ChatEventBus>,
    pub facade: Arc<ChatSessionFacade>,
}

pub fn harness() -> Harness {
    harness_with(ChatConfig::default())
}

pub fn harness_with(config: ChatConfig) -> Harness {
    let store = Arc::new(folio_db::memory_store());
    let clock = Arc::new(ManualClock::new(t0()));
    let events = Arc::new(ChatEventBus::default());
    let facade = Arc::new(ChatSessionFacade::new(
        store.clone(),
        clock.clone(),
        &config,
        events.clone(),
    ));
    Harness {
        store,
        clock,
        events,
        facade,
    }
}

/// Config with a short store timeout for timeout tests.
pub fn fast_timeout_config() -> ChatConfig {
    ChatConfig {
        store_timeout: StdDuration::from_millis(200),
        ..ChatConfig::default()
    }
}

pub fn desktop() -> DeviceMetadata {
    DeviceMetadata::new(CHROME_DESKTOP, "10.0.0.1")
}

pub fn phone() -> DeviceMetadata {
    DeviceMetadata::new(SAFARI_IPHONE, "10.0.0.2")
}

impl Harness {
    pub async fn login(&self, user_id: DbId, device: DeviceMetadata) -> IssuedSession {
        self.facade.login(user_id, &device).await.unwrap()
    }

    pub async fn is_online(&self, user_id: DbId) -> bool {
        self.facade.get_presence(user_id, None).await.unwrap().is_online
    }
}
