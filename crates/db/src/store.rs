//! Document-store abstraction.
//!
//! Documents are JSON objects addressed by `(collection, id)`. Every mutation
//! touches exactly one document and is applied atomically by the backend, so
//! concurrent increments, resets and flips on the same key are linearized by
//! the store rather than by any in-process lock.

use async_trait::async_trait;
use folio_core::error::CoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A stored JSON object.
pub type Document = Map<String, Value>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or timed out.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// An insert collided with an existing id or unique field.
    #[error("Conflict in {collection}: {detail}")]
    Conflict { collection: String, detail: String },

    /// A stored document could not be interpreted.
    #[error("Corrupt document: {0}")]
    Corrupt(String),

    /// An update's precondition did not hold; nothing was written.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Any other backend failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => CoreError::StoreUnavailable(msg),
            StoreError::Conflict { collection, detail } => {
                CoreError::Conflict(format!("{collection}: {detail}"))
            }
            StoreError::Precondition(msg) => CoreError::InvariantViolation(msg),
            StoreError::Corrupt(msg) | StoreError::Backend(msg) => CoreError::Internal(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// A single predicate on a top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    Lt(String, i64),
    Gt(String, i64),
}

/// Conjunction of conditions used by indexed lookups and bulk deletes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(field.to_string(), value.into()));
        self
    }

    pub fn lt(mut self, field: &str, value: i64) -> Self {
        self.conditions.push(Condition::Lt(field.to_string(), value));
        self
    }

    pub fn gt(mut self, field: &str, value: i64) -> Self {
        self.conditions.push(Condition::Gt(field.to_string(), value));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Evaluate the filter against an in-memory document.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|cond| match cond {
            Condition::Eq(field, value) => doc.get(field) == Some(value),
            Condition::Lt(field, bound) => doc
                .get(field)
                .and_then(Value::as_i64)
                .is_some_and(|v| v < *bound),
            Condition::Gt(field, bound) => doc
                .get(field)
                .and_then(Value::as_i64)
                .is_some_and(|v| v > *bound),
        })
    }
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

/// Field operators applied to one document as a single atomic step.
///
/// Preconditions are checked first against the stored document; a failed
/// one aborts the whole update. Then, in order: `set_on_insert` (new
/// documents only), `set`, `inc`, `max`, `toggle`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    at_least: Vec<(String, i64)>,
    set: Document,
    set_on_insert: Document,
    inc: Vec<(String, i64)>,
    max: Vec<(String, i64)>,
    toggle: Vec<String>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort unless the stored integer `field` is at least `min`. A missing
    /// document or field passes.
    pub fn require_at_least(mut self, field: &str, min: i64) -> Self {
        self.at_least.push((field.to_string(), min));
        self
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set.insert(field.to_string(), value.into());
        self
    }

    pub fn set_on_insert(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set_on_insert.insert(field.to_string(), value.into());
        self
    }

    /// Add `by` to an integer field; a missing field counts as zero.
    pub fn inc(mut self, field: &str, by: i64) -> Self {
        self.inc.push((field.to_string(), by));
        self
    }

    /// Raise an integer field to `value` if it is currently lower or missing.
    pub fn max(mut self, field: &str, value: i64) -> Self {
        self.max.push((field.to_string(), value));
        self
    }

    /// Negate a boolean field; a missing field counts as `false`.
    pub fn toggle(mut self, field: &str) -> Self {
        self.toggle.push(field.to_string());
        self
    }
}

/// Document state around an update.
#[derive(Debug, Clone, PartialEq)]
pub struct Updated {
    /// `None` when the update inserted the document.
    pub previous: Option<Document>,
    pub current: Document,
}

/// Apply `update` to `existing` (or to a fresh document when `None`).
///
/// Shared by every backend so operator semantics are identical everywhere.
pub fn apply_update(existing: Option<&Document>, update: &Update) -> StoreResult<Document> {
    if let Some(existing) = existing {
        for (field, min) in &update.at_least {
            if let Some(current) = integer_field(existing, field)?.filter(|v| v < min) {
                return Err(StoreError::Precondition(format!(
                    "'{field}' is {current}, expected at least {min}"
                )));
            }
        }
    }

    let mut doc = match existing {
        Some(doc) => doc.clone(),
        None => update.set_on_insert.clone(),
    };

    for (field, value) in &update.set {
        doc.insert(field.clone(), value.clone());
    }

    for (field, by) in &update.inc {
        let current = integer_field(&doc, field)?.unwrap_or(0);
        let next = current
            .checked_add(*by)
            .ok_or_else(|| StoreError::Corrupt(format!("increment of '{field}' overflowed")))?;
        doc.insert(field.clone(), Value::from(next));
    }

    for (field, value) in &update.max {
        match integer_field(&doc, field)? {
            Some(current) if current >= *value => {}
            _ => {
                doc.insert(field.clone(), Value::from(*value));
            }
        }
    }

    for field in &update.toggle {
        let current = match doc.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(StoreError::Corrupt(format!(
                    "cannot toggle non-boolean field '{field}': {other}"
                )))
            }
        };
        doc.insert(field.clone(), Value::Bool(!current));
    }

    Ok(doc)
}

fn integer_field(doc: &Document, field: &str) -> StoreResult<Option<i64>> {
    match doc.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| StoreError::Corrupt(format!("field '{field}' is not an integer: {value}"))),
    }
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

/// Serialize a model into a document.
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Corrupt(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(StoreError::Corrupt(e.to_string())),
    }
}

/// Deserialize a document into a model.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> StoreResult<T> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Corrupt(e.to_string()))
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// CRUD-by-id plus indexed lookup over JSON documents.
///
/// All operations may suspend on I/O. Implementations must make `update`
/// atomic per document, including the insert path of an upsert.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    async fn find_by(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>>;

    /// Insert a new document; fails with [`StoreError::Conflict`] if the id
    /// (or a unique field) is already taken.
    async fn insert(&self, collection: &str, id: &str, doc: Document) -> StoreResult<()>;

    /// Apply `update` to one document. Returns `None` when the document does
    /// not exist and `upsert` is false.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        update: &Update,
        upsert: bool,
    ) -> StoreResult<Option<Updated>>;

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Cheap liveness probe.
    async fn ping(&self) -> StoreResult<()>;

    /// Update-or-create.
    async fn upsert(&self, collection: &str, id: &str, update: &Update) -> StoreResult<Updated> {
        self.update(collection, id, update, true)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("upsert of {collection}/{id} returned nothing")))
    }

    /// Atomically add `by` to `field`, creating the document from `seed` if
    /// needed. Returns the new value.
    async fn atomic_increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        by: i64,
        seed: Update,
    ) -> StoreResult<i64> {
        let update = seed.inc(field, by);
        let updated = self.upsert(collection, id, &update).await?;
        updated
            .current
            .get(field)
            .and_then(Value::as_i64)
            .ok_or_else(|| StoreError::Corrupt(format!("{collection}/{id}.{field} missing after increment")))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn set_on_insert_only_applies_to_new_documents() {
        let update = Update::new().set_on_insert("kind", "new").set("n", 1);
        let fresh = apply_update(None, &update).unwrap();
        assert_eq!(fresh["kind"], "new");

        let existing = doc(json!({ "kind": "old" }));
        let updated = apply_update(Some(&existing), &update).unwrap();
        assert_eq!(updated["kind"], "old");
        assert_eq!(updated["n"], 1);
    }

    #[test]
    fn inc_treats_missing_as_zero() {
        let update = Update::new().inc("count", 2);
        assert_eq!(apply_update(None, &update).unwrap()["count"], 2);

        let existing = doc(json!({ "count": 5 }));
        assert_eq!(apply_update(Some(&existing), &update).unwrap()["count"], 7);
    }

    #[test]
    fn inc_on_non_integer_is_corrupt() {
        let existing = doc(json!({ "count": "five" }));
        let result = apply_update(Some(&existing), &Update::new().inc("count", 1));
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn max_never_lowers() {
        let existing = doc(json!({ "seen": 100 }));
        let lower = apply_update(Some(&existing), &Update::new().max("seen", 50)).unwrap();
        assert_eq!(lower["seen"], 100);
        let higher = apply_update(Some(&existing), &Update::new().max("seen", 150)).unwrap();
        assert_eq!(higher["seen"], 150);
    }

    #[test]
    fn set_then_inc_resets_then_counts() {
        let existing = doc(json!({ "count": 9 }));
        let update = Update::new().set("count", 0).inc("count", 1);
        assert_eq!(apply_update(Some(&existing), &update).unwrap()["count"], 1);
    }

    #[test]
    fn toggle_flips_and_defaults_to_false() {
        let toggled = apply_update(None, &Update::new().toggle("hidden")).unwrap();
        assert_eq!(toggled["hidden"], true);
        let back = apply_update(Some(&toggled), &Update::new().toggle("hidden")).unwrap();
        assert_eq!(back["hidden"], false);
    }

    #[test]
    fn failed_precondition_aborts_before_any_operator() {
        let existing = doc(json!({ "count": -2 }));
        let update = Update::new().require_at_least("count", 0).inc("count", 1);
        let result = apply_update(Some(&existing), &update);
        assert!(matches!(result, Err(StoreError::Precondition(_))));

        let ok = doc(json!({ "count": 0 }));
        assert_eq!(apply_update(Some(&ok), &update).unwrap()["count"], 1);
        assert_eq!(apply_update(None, &update).unwrap()["count"], 1);
    }

    #[test]
    fn filter_matches_eq_and_ranges() {
        let d = doc(json!({ "user_id": 7, "expires_at": 1000 }));
        assert!(Filter::new().eq("user_id", 7).matches(&d));
        assert!(!Filter::new().eq("user_id", 8).matches(&d));
        assert!(Filter::new().lt("expires_at", 1001).matches(&d));
        assert!(!Filter::new().lt("expires_at", 1000).matches(&d));
        assert!(Filter::new().gt("expires_at", 999).matches(&d));
        assert!(!Filter::new().gt("missing", 0).matches(&d));
    }

    #[test]
    fn unavailable_maps_to_store_unavailable() {
        let err: CoreError = StoreError::Unavailable("timeout".into()).into();
        assert!(matches!(err, CoreError::StoreUnavailable(_)));
        let err: CoreError = StoreError::Corrupt("bad".into()).into();
        assert!(matches!(err, CoreError::Internal(_)));
        let err: CoreError = StoreError::Precondition("negative".into()).into();
        assert!(matches!(err, CoreError::InvariantViolation(_)));
    }
}
