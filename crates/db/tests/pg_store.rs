//! PostgreSQL backend tests. Run with `DATABASE_URL` pointing at a scratch
//! database: `cargo test -p folio-db -- --ignored`.

use assert_matches::assert_matches;
use folio_db::store::{DocumentStore, Filter, StoreError, Update};
use folio_db::PgStore;
use serde_json::json;
use sqlx::PgPool;

fn doc(value: serde_json::Value) -> folio_db::store::Document {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("not an object"),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn pg_insert_find_and_conflict(pool: PgPool) {
    let store = PgStore::new(pool);
    store.insert("users", "1", doc(json!({"username": "ada"}))).await.unwrap();

    let found = store.find("users", "1").await.unwrap().unwrap();
    assert_eq!(found["username"], "ada");

    assert_matches!(
        store.insert("users", "2", doc(json!({"username": "ada"}))).await,
        Err(StoreError::Conflict { .. })
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn pg_concurrent_increments(pool: PgPool) {
    let store = std::sync::Arc::new(PgStore::new(pool));
    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = std::sync::Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .atomic_increment("unread", "1:t", "unread_count", 1, Update::new())
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    let stored = store.find("unread", "1:t").await.unwrap().unwrap();
    assert_eq!(stored["unread_count"], 20);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn pg_filters_and_delete(pool: PgPool) {
    let store = PgStore::new(pool);
    for (id, user, exp) in [("a", 1, 10), ("b", 1, 30), ("c", 2, 5)] {
        store
            .insert("sessions", id, doc(json!({"user_id": user, "expires_at": exp, "token_hash": id})))
            .await
            .unwrap();
    }

    let live = store
        .find_by("sessions", &Filter::new().eq("user_id", 1).gt("expires_at", 20))
        .await
        .unwrap();
    assert_eq!(live.len(), 1);

    let deleted = store
        .delete_many("sessions", &Filter::new().lt("expires_at", 20))
        .await
        .unwrap();
    assert_eq!(deleted, 2);
}
