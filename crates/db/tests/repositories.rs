use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use folio_core::types::Timestamp;
use folio_db::models::session::CreateSession;
use folio_db::models::user::CreateUser;
use folio_db::repositories::{PresenceRepo, SessionRepo, TypingRepo, UnreadRepo, UserRepo};
use folio_db::store::{DocumentStore, StoreError};

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn new_session(user_id: i64, hash: &str, expires_at: Timestamp) -> CreateSession {
    CreateSession {
        user_id,
        token_hash: hash.to_string(),
        device_label: "Desktop/Chrome".to_string(),
        user_agent: None,
        ip_address: Some("10.0.0.1".to_string()),
        created_at: t0(),
        expires_at,
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn session_create_and_lookup_by_hash() {
    let store = folio_db::memory_store();
    let created = SessionRepo::create(&store, &new_session(1, "h1", t0() + Duration::days(30)))
        .await
        .unwrap();

    let found = SessionRepo::find_by_token_hash(&store, "h1").await.unwrap().unwrap();
    assert_eq!(found, created);
    assert_eq!(found.last_active_at, t0());
    assert!(SessionRepo::find_by_token_hash(&store, "nope").await.unwrap().is_none());
}

#[tokio::test]
async fn session_token_hash_is_unique() {
    let store = folio_db::memory_store();
    SessionRepo::create(&store, &new_session(1, "h1", t0())).await.unwrap();
    let err = SessionRepo::create(&store, &new_session(2, "h1", t0()))
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Conflict { .. });
}

#[tokio::test]
async fn revoke_is_idempotent() {
    let store = folio_db::memory_store();
    let s = SessionRepo::create(&store, &new_session(1, "h1", t0())).await.unwrap();

    let first = SessionRepo::revoke(&store, s.id).await.unwrap().unwrap();
    assert!(first.newly_revoked);
    assert!(first.session.revoked);

    let second = SessionRepo::revoke(&store, s.id).await.unwrap().unwrap();
    assert!(!second.newly_revoked);
    assert!(second.session.revoked);
}

#[tokio::test]
async fn touch_never_clears_revocation() {
    let store = folio_db::memory_store();
    let s = SessionRepo::create(&store, &new_session(1, "h1", t0() + Duration::days(1)))
        .await
        .unwrap();
    SessionRepo::revoke(&store, s.id).await.unwrap();

    let touched = SessionRepo::touch(&store, s.id, t0() + Duration::hours(1))
        .await
        .unwrap()
        .unwrap();
    assert!(touched.revoked);
    assert_eq!(touched.last_active_at, t0() + Duration::hours(1));
}

#[tokio::test]
async fn revoke_all_returns_only_newly_revoked() {
    let store = folio_db::memory_store();
    let a = SessionRepo::create(&store, &new_session(1, "a", t0())).await.unwrap();
    SessionRepo::create(&store, &new_session(1, "b", t0())).await.unwrap();
    SessionRepo::create(&store, &new_session(2, "c", t0())).await.unwrap();
    SessionRepo::revoke(&store, a.id).await.unwrap();

    let revoked = SessionRepo::revoke_all_for_user(&store, 1).await.unwrap();
    assert_eq!(revoked.len(), 1);
    assert_eq!(revoked[0].token_hash, "b");

    let other = SessionRepo::find_by_token_hash(&store, "c").await.unwrap().unwrap();
    assert!(!other.revoked);
}

#[tokio::test]
async fn delete_expired_before_keeps_recent() {
    let store = folio_db::memory_store();
    SessionRepo::create(&store, &new_session(1, "old", t0() - Duration::days(10)))
        .await
        .unwrap();
    SessionRepo::create(&store, &new_session(1, "recent", t0() - Duration::days(1)))
        .await
        .unwrap();

    let deleted = SessionRepo::delete_expired_before(&store, 1, t0() - Duration::days(7))
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    let remaining = SessionRepo::list_for_user(&store, 1).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].token_hash, "recent");
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn presence_transitions_are_reported() {
    let store = folio_db::memory_store();

    let change = PresenceRepo::mark_online(&store, 1, t0()).await.unwrap();
    assert!(change.flipped());
    let change = PresenceRepo::mark_online(&store, 1, t0()).await.unwrap();
    assert!(!change.flipped());
    let change = PresenceRepo::mark_offline(&store, 1, t0()).await.unwrap();
    assert!(change.flipped());
}

#[tokio::test]
async fn last_seen_never_moves_backwards() {
    let store = folio_db::memory_store();
    PresenceRepo::mark_online(&store, 1, t0()).await.unwrap();
    PresenceRepo::mark_offline(&store, 1, t0() - Duration::hours(1)).await.unwrap();

    let presence = PresenceRepo::find(&store, 1).await.unwrap().unwrap();
    assert!(!presence.is_online);
    assert_eq!(presence.last_seen_at, Some(t0()));
}

#[tokio::test]
async fn hide_toggle_flips_and_preserves_online() {
    let store = folio_db::memory_store();
    PresenceRepo::mark_online(&store, 1, t0()).await.unwrap();

    assert!(PresenceRepo::toggle_hide_last_seen(&store, 1).await.unwrap());
    assert!(!PresenceRepo::toggle_hide_last_seen(&store, 1).await.unwrap());

    let presence = PresenceRepo::set_hide_last_seen(&store, 1, true).await.unwrap();
    assert!(presence.hide_last_seen);
    assert!(presence.is_online);
}

#[tokio::test]
async fn toggle_creates_record_for_unknown_user() {
    let store = folio_db::memory_store();
    assert!(PresenceRepo::toggle_hide_last_seen(&store, 9).await.unwrap());
    let presence = PresenceRepo::find(&store, 9).await.unwrap().unwrap();
    assert!(!presence.is_online);
    assert!(presence.last_seen_at.is_none());
}

// ---------------------------------------------------------------------------
// Unread
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unread_increment_and_mark_read() {
    let store = folio_db::memory_store();
    for expected in 1..=3 {
        assert_eq!(UnreadRepo::increment(&store, 1, "abc").await.unwrap(), expected);
    }

    let state = UnreadRepo::mark_read(&store, 1, "abc", t0()).await.unwrap();
    assert_eq!(state.unread_count, 0);
    assert_eq!(state.last_read_at, Some(t0()));

    assert_eq!(UnreadRepo::increment(&store, 1, "abc").await.unwrap(), 1);
    let listed = UnreadRepo::list_for_user(&store, 1).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].thread_id, "abc");
}

#[tokio::test]
async fn concurrent_increments_and_reads_never_go_negative() {
    let store: Arc<dyn DocumentStore> = Arc::new(folio_db::memory_store());
    let mut handles = Vec::new();
    for i in 0..40 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            if i % 4 == 0 {
                UnreadRepo::mark_read(store.as_ref(), 1, "t", t0()).await.unwrap();
            } else {
                UnreadRepo::increment(store.as_ref(), 1, "t").await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let state = UnreadRepo::find(store.as_ref(), 1, "t").await.unwrap().unwrap();
    assert!(state.unread_count >= 0);
    assert!(state.unread_count <= 30);

    UnreadRepo::mark_read(store.as_ref(), 1, "t", t0()).await.unwrap();
    assert_eq!(UnreadRepo::increment(store.as_ref(), 1, "t").await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Typing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn typing_entries_expire_on_read() {
    let store = folio_db::memory_store();
    TypingRepo::upsert(&store, "abc", 1, t0() + Duration::seconds(6)).await.unwrap();
    TypingRepo::upsert(&store, "abc", 2, t0() + Duration::seconds(2)).await.unwrap();
    TypingRepo::upsert(&store, "other", 3, t0() + Duration::seconds(6)).await.unwrap();

    let live = TypingRepo::list_live(&store, "abc", t0() + Duration::seconds(3))
        .await
        .unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].user_id, 1);

    assert!(TypingRepo::clear(&store, "abc", 1).await.unwrap());
    assert!(!TypingRepo::clear(&store, "abc", 1).await.unwrap());
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_username_is_unique() {
    let store = folio_db::memory_store();
    let input = CreateUser {
        id: 1,
        username: "ada".to_string(),
        password_hash: "$argon2id$stub".to_string(),
    };
    UserRepo::create(&store, &input, t0()).await.unwrap();

    let found = UserRepo::find_by_username(&store, "ada").await.unwrap().unwrap();
    assert_eq!(found.id, 1);
    assert!(found.is_active);

    let dup = CreateUser { id: 2, ..input };
    assert_matches!(
        UserRepo::create(&store, &dup, t0()).await,
        Err(StoreError::Conflict { .. })
    );
}
