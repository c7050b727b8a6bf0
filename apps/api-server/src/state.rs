//! Application state - shared across all handlers.

use std::sync::Arc;

use updraft_core::ports::{
    Cache, PasswordService, PostRepository, SessionStore, UserRepository, VotingEngine,
};
use updraft_infra::auth::{Argon2PasswordService, CacheSessionStore};
use updraft_infra::cache::{InMemoryCache, RedisCache, RedisConfig};
use updraft_infra::database::{
    PgVotingEngine, PostgresPostRepository, PostgresUserRepository, connect,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub votes: Arc<dyn VotingEngine>,
    pub sessions: Arc<dyn SessionStore>,
    pub passwords: Arc<dyn PasswordService>,
}

impl AppState {
    /// Build the application state from configuration.
    pub async fn new(config: &AppConfig) -> Result<Self, String> {
        let db = Arc::new(
            connect(&config.database)
                .await
                .map_err(|e| format!("database connection failed: {e}"))?,
        );

        let cache: Arc<dyn Cache> = match &config.redis_url {
            Some(url) => {
                let redis = RedisCache::new(RedisConfig::new(url.as_str()))
                    .await
                    .map_err(|e| format!("redis connection failed: {e}"))?;
                Arc::new(redis)
            }
            None => {
                tracing::warn!("REDIS_URL not set - sessions held in memory, lost on restart");
                Arc::new(InMemoryCache::new())
            }
        };

        let sessions: Arc<dyn SessionStore> =
            Arc::new(CacheSessionStore::new(cache, config.session_ttl));

        let state = Self {
            users: Arc::new(PostgresUserRepository::new(Arc::clone(&db))),
            posts: Arc::new(PostgresPostRepository::new(Arc::clone(&db))),
            votes: Arc::new(PgVotingEngine::new(db)),
            sessions,
            passwords: Arc::new(Argon2PasswordService::new()),
        };

        tracing::info!("Application state initialized");
        Ok(state)
    }
}
