//! Repository for the `users` collection.

use folio_core::types::{DbId, Timestamp};

use crate::models::user::{CreateUser, User, COLLECTION};
use crate::store::{from_document, to_document, DocumentStore, Filter, StoreResult};

pub struct UserRepo;

impl UserRepo {
    /// Insert a new active user. Fails with `Conflict` on a duplicate id or
    /// username.
    pub async fn create(store: &dyn DocumentStore, input: &CreateUser, now: Timestamp) -> StoreResult<User> {
        let user = User {
            id: input.id,
            username: input.username.clone(),
            password_hash: input.password_hash.clone(),
            is_active: true,
            created_at: now,
        };
        store
            .insert(COLLECTION, &user.id.to_string(), to_document(&user)?)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(store: &dyn DocumentStore, id: DbId) -> StoreResult<Option<User>> {
        store
            .find(COLLECTION, &id.to_string())
            .await?
            .map(from_document)
            .transpose()
    }

    pub async fn find_by_username(store: &dyn DocumentStore, username: &str) -> StoreResult<Option<User>> {
        let docs = store
            .find_by(COLLECTION, &Filter::new().eq("username", username))
            .await?;
        docs.into_iter().next().map(from_document).transpose()
    }
}
