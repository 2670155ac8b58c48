/// User ids are owned by the external auth layer and are BIGSERIAL-style integers.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Sessions are identified by time-sortable UUIDs.
pub type SessionId = uuid::Uuid;

/// Opaque conversation key supplied by the messaging transport.
pub type ThreadId = String;
