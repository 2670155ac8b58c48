use std::fmt::Display;
use std::str::FromStr;

use folio_chat::ChatConfig;

/// Process-level settings for the API server. Session, presence and typing
/// tunables live in the embedded [`ChatConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API and open sockets.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How long to wait for background tasks on shutdown.
    pub shutdown_timeout_secs: u64,
    /// Seconds between socket pings and lapsed-session sweeps.
    pub heartbeat_secs: u64,
    pub chat: ChatConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            heartbeat_secs: 30,
            chat: ChatConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// [`Default`]. Invalid values abort startup with the variable's name.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `WS_HEARTBEAT_SECS`     | `30`                    |
    ///
    /// Chat settings are read by [`ChatConfig::from_env`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_parsed("PORT", defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or(defaults.cors_origins),
            request_timeout_secs: env_positive("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            shutdown_timeout_secs: env_parsed("SHUTDOWN_TIMEOUT_SECS", defaults.shutdown_timeout_secs),
            heartbeat_secs: env_positive("WS_HEARTBEAT_SECS", defaults.heartbeat_secs),
            chat: ChatConfig::from_env(),
        }
    }
}

/// Split a comma-separated origin list, trimming entries and dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_parsed<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_setting(name, &raw).unwrap_or_else(|msg| panic!("{msg}")),
        Err(_) => default,
    }
}

fn env_positive(name: &str, default: u64) -> u64 {
    let value = env_parsed(name, default);
    assert!(value > 0, "{name} must be greater than zero");
    value
}

fn parse_setting<T>(name: &str, raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| format!("{name} has invalid value '{raw}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blanks_dropped() {
        assert_eq!(
            parse_origins(" https://app.example.com , ,http://localhost:5173,"),
            vec!["https://app.example.com", "http://localhost:5173"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn invalid_setting_names_the_variable() {
        let err = parse_setting::<u16>("PORT", "70000").unwrap_err();
        assert!(err.starts_with("PORT has invalid value '70000'"));
        assert_eq!(parse_setting::<u64>("WS_HEARTBEAT_SECS", " 15 ").unwrap(), 15);
    }
}
