use std::time::Duration as StdDuration;

use chrono::Duration;
use folio_core::session::{
    DEFAULT_ACTIVITY_REFRESH_SECS, DEFAULT_EXPIRED_RETENTION_DAYS, DEFAULT_SESSION_TTL_DAYS,
};
use folio_core::typing::{validate_typing_ttl, DEFAULT_TYPING_TTL_SECS};

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;

/// Upper bound for day-valued settings; keeps `now + ttl` representable.
pub const MAX_CONFIG_DAYS: i64 = 3_650;

/// Tunables for the chat/session subsystem.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Lifetime of a new session.
    pub session_ttl: Duration,
    /// Minimum age of `last_active_at` before it is rewritten.
    pub activity_refresh: Duration,
    /// How long expired sessions are kept before lazy collection.
    pub expired_retention: Duration,
    /// Lifetime of a typing indicator.
    pub typing_ttl: Duration,
    /// Upper bound on any single store call.
    pub store_timeout: StdDuration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::days(DEFAULT_SESSION_TTL_DAYS),
            activity_refresh: Duration::seconds(DEFAULT_ACTIVITY_REFRESH_SECS),
            expired_retention: Duration::days(DEFAULT_EXPIRED_RETENTION_DAYS),
            typing_ttl: Duration::seconds(DEFAULT_TYPING_TTL_SECS),
            store_timeout: StdDuration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        }
    }
}

impl ChatConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `SESSION_TTL_DAYS`       | `30`    |
    /// | `SESSION_REFRESH_SECS`   | `300`   |
    /// | `SESSION_RETENTION_DAYS` | `7`     |
    /// | `TYPING_TTL_SECS`        | `6`     |
    /// | `STORE_TIMEOUT_MS`       | `2000`  |
    pub fn from_env() -> Self {
        let session_ttl_days: i64 = env_or("SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS)
            .expect("SESSION_TTL_DAYS must be a valid i64");
        let refresh_secs: i64 = env_or("SESSION_REFRESH_SECS", DEFAULT_ACTIVITY_REFRESH_SECS)
            .expect("SESSION_REFRESH_SECS must be a valid i64");
        let retention_days: i64 = env_or("SESSION_RETENTION_DAYS", DEFAULT_EXPIRED_RETENTION_DAYS)
            .expect("SESSION_RETENTION_DAYS must be a valid i64");
        let typing_ttl_secs: i64 = env_or("TYPING_TTL_SECS", DEFAULT_TYPING_TTL_SECS)
            .expect("TYPING_TTL_SECS must be a valid i64");
        let store_timeout_ms: u64 = env_or("STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)
            .expect("STORE_TIMEOUT_MS must be a valid u64");

        assert!(session_ttl_days > 0, "SESSION_TTL_DAYS must be positive");
        if let Err(msg) = validate_typing_ttl(typing_ttl_secs) {
            panic!("TYPING_TTL_SECS: {msg}");
        }
        let session_ttl = days_setting(session_ttl_days)
            .unwrap_or_else(|msg| panic!("SESSION_TTL_DAYS: {msg}"));
        let expired_retention = days_setting(retention_days.max(0))
            .unwrap_or_else(|msg| panic!("SESSION_RETENTION_DAYS: {msg}"));
        let activity_refresh = Duration::try_seconds(refresh_secs.max(0))
            .unwrap_or_else(|| panic!("SESSION_REFRESH_SECS: {refresh_secs} is out of range"));

        Self {
            session_ttl,
            activity_refresh,
            expired_retention,
            typing_ttl: Duration::seconds(typing_ttl_secs),
            store_timeout: StdDuration::from_millis(store_timeout_ms),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, T::Err> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse(),
        Err(_) => Ok(default),
    }
}

/// A whole number of days, at most [`MAX_CONFIG_DAYS`].
fn days_setting(days: i64) -> Result<Duration, String> {
    if days > MAX_CONFIG_DAYS {
        return Err(format!("{days} exceeds the maximum of {MAX_CONFIG_DAYS} days"));
    }
    Duration::try_days(days).ok_or_else(|| format!("{days} days is out of range"))
}
