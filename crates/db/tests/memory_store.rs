use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use folio_db::store::{DocumentStore, Filter, StoreError, Update};
use folio_db::MemoryStore;
use serde_json::json;

fn doc(value: serde_json::Value) -> folio_db::store::Document {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("not an object"),
    }
}

#[tokio::test]
async fn insert_rejects_duplicate_id() {
    let store = MemoryStore::new();
    store.insert("things", "1", doc(json!({"a": 1}))).await.unwrap();

    let err = store.insert("things", "1", doc(json!({"a": 2}))).await.unwrap_err();
    assert_matches!(err, StoreError::Conflict { .. });
    assert_eq!(store.find("things", "1").await.unwrap().unwrap()["a"], 1);
}

#[tokio::test]
async fn unique_index_rejects_duplicate_field() {
    let store = folio_db::memory_store();
    store
        .insert("users", "1", doc(json!({"username": "ada"})))
        .await
        .unwrap();

    let err = store
        .insert("users", "2", doc(json!({"username": "ada"})))
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Conflict { .. });
    assert_eq!(store.len("users").await, 1);
}

#[tokio::test]
async fn update_without_upsert_on_missing_returns_none() {
    let store = MemoryStore::new();
    let result = store
        .update("things", "missing", &Update::new().set("a", 1), false)
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(store.len("things").await, 0);
}

#[tokio::test]
async fn upsert_reports_previous_document() {
    let store = MemoryStore::new();
    let first = store
        .upsert("things", "1", &Update::new().set("flag", true))
        .await
        .unwrap();
    assert!(first.previous.is_none());

    let second = store
        .upsert("things", "1", &Update::new().set("flag", false))
        .await
        .unwrap();
    assert_eq!(second.previous.unwrap()["flag"], true);
    assert_eq!(second.current["flag"], false);
}

#[tokio::test]
async fn concurrent_increments_are_not_lost() {
    let store = Arc::new(MemoryStore::new());
    let mut handles = Vec::new();
    for _ in 0..50 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .atomic_increment("counters", "c", "n", 1, Update::new())
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stored = store.find("counters", "c").await.unwrap().unwrap();
    assert_eq!(stored["n"], 50);
}

#[tokio::test]
async fn delete_many_applies_filter() {
    let store = MemoryStore::new();
    for (id, exp) in [("a", 10), ("b", 20), ("c", 30)] {
        store
            .insert("s", id, doc(json!({"user_id": 1, "expires_at": exp})))
            .await
            .unwrap();
    }
    store
        .insert("s", "d", doc(json!({"user_id": 2, "expires_at": 5})))
        .await
        .unwrap();

    let deleted = store
        .delete_many("s", &Filter::new().eq("user_id", 1).lt("expires_at", 25))
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(store.len("s").await, 2);
}

#[tokio::test]
async fn injected_failures_then_recovery() {
    let store = MemoryStore::new();
    store.fail_next(1);
    assert_matches!(store.ping().await, Err(StoreError::Unavailable(_)));
    assert!(store.ping().await.is_ok());

    store.set_unavailable(true);
    assert_matches!(store.find("x", "1").await, Err(StoreError::Unavailable(_)));
    store.set_unavailable(false);
    assert!(store.find("x", "1").await.unwrap().is_none());
    assert_eq!(store.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn latency_delays_calls() {
    let store = MemoryStore::new();
    store.set_latency(Duration::from_millis(500));

    let started = tokio::time::Instant::now();
    store.ping().await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(500));
}

#[tokio::test]
async fn failed_precondition_leaves_document_untouched() {
    let store = MemoryStore::new();
    store
        .upsert("counters", "c", &Update::new().set("n", -3))
        .await
        .unwrap();

    let result = store
        .atomic_increment("counters", "c", "n", 1, Update::new().require_at_least("n", 0))
        .await;
    assert_matches!(result, Err(StoreError::Precondition(_)));
    assert_eq!(store.find("counters", "c").await.unwrap().unwrap()["n"], -3);
}
