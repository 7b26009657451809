//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Filesystem path of the SQLite database.
    /// Env: `DB_PATH`
    /// Default: unset, which means the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Upper bound on how long one request may run before the boundary cuts
    /// it off.  Timeout policy lives here, never inside the workflow.
    /// Env: `REQUEST_TIMEOUT_SECS`
    /// Default: `30`
    pub request_timeout: Duration,

    /// How long SQLite waits on a locked database before giving up.
    /// Env: `DB_BUSY_TIMEOUT_MS`
    /// Default: `5000`
    pub db_busy_timeout: Duration,

    /// Interval between expired-session purge runs.
    /// Env: `SESSION_PURGE_INTERVAL_SECS`
    /// Default: `600`
    pub session_purge_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            db_path: None,
            request_timeout: Duration::from_secs(30),
            db_busy_timeout: Duration::from_millis(5000),
            session_purge_interval: Duration::from_secs(600),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Ok(path) = std::env::var("DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Ok(val) = std::env::var("REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.request_timeout = Duration::from_secs(secs);
            } else {
                tracing::warn!(value = %val, "Invalid REQUEST_TIMEOUT_SECS, using default");
            }
        }

        if let Ok(val) = std::env::var("DB_BUSY_TIMEOUT_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                config.db_busy_timeout = Duration::from_millis(ms);
            } else {
                tracing::warn!(value = %val, "Invalid DB_BUSY_TIMEOUT_MS, using default");
            }
        }

        if let Ok(val) = std::env::var("SESSION_PURGE_INTERVAL_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.session_purge_interval = Duration::from_secs(secs);
            } else {
                tracing::warn!(value = %val, "Invalid SESSION_PURGE_INTERVAL_SECS, using default");
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.db_busy_timeout, Duration::from_millis(5000));
        assert!(config.db_path.is_none());
    }
}
