//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use updraft_infra::DatabaseConfig;

/// Default session lifetime: two weeks.
const DEFAULT_SESSION_TTL_SECS: u64 = 14 * 24 * 60 * 60;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    /// Redis URL; when unset the in-memory cache is used instead.
    pub redis_url: Option<String>,
    pub session_ttl: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables. The database URL is
    /// mandatory: every operation in this service goes through the store.
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let database = DatabaseConfig {
            url: database_url,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database,
            redis_url: env::var("REDIS_URL").ok(),
            session_ttl: Duration::from_secs(
                env::var("SESSION_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SESSION_TTL_SECS),
            ),
        })
    }
}
