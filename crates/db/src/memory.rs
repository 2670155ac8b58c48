//! In-process [`DocumentStore`] used for local development and tests.
//!
//! Each mutation runs under the collection map's write lock, which gives the
//! same per-document atomicity the Postgres backend gets from row locks. It
//! can also simulate a slow or failing backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{
    apply_update, Document, DocumentStore, Filter, StoreError, StoreResult, Update, Updated,
};

type Collection = HashMap<String, Document>;

/// Nested-map document store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    /// `(collection, field)` pairs whose values must be unique.
    unique: Vec<(String, String)>,
    latency_ms: AtomicU64,
    unavailable: AtomicBool,
    failures_remaining: AtomicU32,
    calls: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforce uniqueness of `field` within `collection` on insert.
    pub fn with_unique_index(mut self, collection: &str, field: &str) -> Self {
        self.unique.push((collection.to_string(), field.to_string()));
        self
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Make every call fail with [`StoreError::Unavailable`] until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail the next `n` calls with [`StoreError::Unavailable`].
    pub fn fail_next(&self, n: u32) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Total number of calls received, including failed ones.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of documents in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, HashMap::len)
    }

    async fn gate(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }

        let injected = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Unavailable("injected failure".into()));
        }

        Ok(())
    }

    fn check_unique(
        &self,
        collection_name: &str,
        collection: &Collection,
        doc: &Document,
    ) -> StoreResult<()> {
        for (coll, field) in &self.unique {
            if coll != collection_name {
                continue;
            }
            let Some(value) = doc.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            if collection.values().any(|other| other.get(field) == Some(value)) {
                return Err(StoreError::Conflict {
                    collection: collection_name.to_string(),
                    detail: format!("duplicate value for unique field '{field}'"),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.gate().await?;
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    async fn find_by(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        self.gate().await?;
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|c| c.values().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, id: &str, doc: Document) -> StoreResult<()> {
        self.gate().await?;
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_string()).or_default();
        if coll.contains_key(id) {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                detail: format!("id '{id}' already exists"),
            });
        }
        self.check_unique(collection, coll, &doc)?;
        coll.insert(id.to_string(), doc);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        update: &Update,
        upsert: bool,
    ) -> StoreResult<Option<Updated>> {
        self.gate().await?;
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_string()).or_default();

        let previous = coll.get(id).cloned();
        if previous.is_none() && !upsert {
            return Ok(None);
        }

        let current = apply_update(previous.as_ref(), update)?;
        coll.insert(id.to_string(), current.clone());
        Ok(Some(Updated { previous, current }))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        self.gate().await?;
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = coll.len();
        coll.retain(|_, doc| !filter.matches(doc));
        Ok((before - coll.len()) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.gate().await
    }
}
