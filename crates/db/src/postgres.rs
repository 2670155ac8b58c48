//! PostgreSQL-backed [`DocumentStore`] over a single JSONB `documents` table.
//!
//! Updates run inside a transaction that row-locks the target document
//! (`SELECT .. FOR UPDATE`), so increments, resets and toggles from several
//! API processes are linearized per document.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::store::{
    apply_update, Condition, Document, DocumentStore, Filter, StoreError, StoreResult, Update,
    Updated,
};

/// Postgres document store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append `AND ...` clauses for `filter` to a query that already has a
/// `WHERE collection = $n` clause.
///
/// Equality conditions are folded into a single `body @> {...}` containment
/// test so the GIN index on `body` applies.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    let mut containment = Document::new();
    for cond in filter.conditions() {
        match cond {
            Condition::Eq(field, value) => {
                containment.insert(field.clone(), value.clone());
            }
            Condition::Lt(field, bound) => {
                qb.push(" AND (body ->> ")
                    .push_bind(field.clone())
                    .push(")::bigint < ")
                    .push_bind(*bound);
            }
            Condition::Gt(field, bound) => {
                qb.push(" AND (body ->> ")
                    .push_bind(field.clone())
                    .push(")::bigint > ")
                    .push_bind(*bound);
            }
        }
    }
    if !containment.is_empty() {
        qb.push(" AND body @> ")
            .push_bind(Json(Value::Object(containment)));
    }
}

/// Classify a sqlx error into a [`StoreError`].
///
/// - Connection-level failures map to `Unavailable`.
/// - Unique constraint violations (SQLSTATE 23505) map to `Conflict`.
fn classify_sqlx_error(collection: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(err.to_string())
        }
        sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some("23505") => {
            StoreError::Conflict {
                collection: collection.to_string(),
                detail: db_err
                    .constraint()
                    .map_or_else(|| db_err.message().to_string(), str::to_string),
            }
        }
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query_scalar::<_, Json<Document>>(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error(collection, e))?;
        Ok(row.map(|Json(doc)| doc))
    }

    async fn find_by(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT body FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY id");

        let rows = qb
            .build_query_scalar::<Json<Document>>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify_sqlx_error(collection, e))?;
        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn insert(&self, collection: &str, id: &str, doc: Document) -> StoreResult<()> {
        let result = sqlx::query(
            "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id) DO NOTHING",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(doc))
        .execute(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error(collection, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                detail: format!("id '{id}' already exists"),
            });
        }
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        update: &Update,
        upsert: bool,
    ) -> StoreResult<Option<Updated>> {
        let map_err = |e: sqlx::Error| classify_sqlx_error(collection, e);
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        // An empty placeholder row makes concurrent upserts of a missing
        // document queue on the same row lock instead of racing to insert.
        let inserted = if upsert {
            sqlx::query(
                "INSERT INTO documents (collection, id, body) VALUES ($1, $2, '{}'::jsonb)
                 ON CONFLICT (collection, id) DO NOTHING",
            )
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?
            .rows_affected()
                == 1
        } else {
            false
        };

        let locked = sqlx::query_scalar::<_, Json<Document>>(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_err)?;

        let Some(Json(existing)) = locked else {
            tx.rollback().await.map_err(map_err)?;
            return Ok(None);
        };

        let previous = if inserted { None } else { Some(existing) };
        let current = apply_update(previous.as_ref(), update)?;

        sqlx::query(
            "UPDATE documents SET body = $3, updated_at = NOW()
             WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(&current))
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        tx.commit().await.map_err(map_err)?;
        Ok(Some(Updated { previous, current }))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());
        push_filter(&mut qb, filter);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| classify_sqlx_error(collection, e))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| classify_sqlx_error("documents", e))
    }
}
