//! Document storage for sessions, presence, unread counters and typing state.
//!
//! - [`store`] -- the [`DocumentStore`](store::DocumentStore) trait and its
//!   atomic update operators.
//! - [`memory`] / [`postgres`] -- backends.
//! - [`models`] / [`repositories`] -- typed documents and the zero-sized
//!   repositories that read and write them.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

pub mod memory;
pub mod models;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{DocumentStore, StoreError, StoreResult};

pub type DbPool = sqlx::PgPool;

/// Shared handle to whichever backend is configured.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the pool can execute a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations in `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// A [`MemoryStore`] with the same unique constraints the Postgres schema has.
pub fn memory_store() -> MemoryStore {
    MemoryStore::new()
        .with_unique_index(models::session::COLLECTION, "token_hash")
        .with_unique_index(models::user::COLLECTION, "username")
}
