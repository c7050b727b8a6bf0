//! Cache-backed session store.
//!
//! Sessions are opaque random tokens mapped to user ids in the cache with a
//! TTL. The rest of the system only ever consumes the resolved user id.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use updraft_core::ports::{AuthError, Cache, SessionStore};

const SESSION_KEY_PREFIX: &str = "sess:";

pub struct CacheSessionStore {
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl CacheSessionStore {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    fn key(token: &str) -> String {
        format!("{SESSION_KEY_PREFIX}{token}")
    }
}

#[async_trait]
impl SessionStore for CacheSessionStore {
    async fn create(&self, user_id: i64) -> Result<String, AuthError> {
        let token = Uuid::new_v4().simple().to_string();

        self.cache
            .set(&Self::key(&token), &user_id.to_string(), Some(self.ttl))
            .await
            .map_err(|e| AuthError::SessionBackend(e.to_string()))?;

        tracing::debug!(user_id, "Session created");
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<i64>, AuthError> {
        let Some(raw) = self.cache.get(&Self::key(token)).await else {
            return Ok(None);
        };

        // A corrupt value is a backend problem, not an anonymous viewer.
        raw.parse::<i64>()
            .map(Some)
            .map_err(|_| AuthError::SessionBackend(format!("malformed session value: {raw}")))
    }

    async fn destroy(&self, token: &str) -> Result<(), AuthError> {
        self.cache
            .delete(&Self::key(token))
            .await
            .map_err(|e| AuthError::SessionBackend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;

    fn store() -> CacheSessionStore {
        CacheSessionStore::new(Arc::new(InMemoryCache::new()), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let sessions = store();
        let token = sessions.create(42).await.unwrap();
        assert_eq!(sessions.resolve(&token).await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_none() {
        let sessions = store();
        assert_eq!(sessions.resolve("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_destroy() {
        let sessions = store();
        let token = sessions.create(42).await.unwrap();
        sessions.destroy(&token).await.unwrap();
        assert_eq!(sessions.resolve(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let sessions = store();
        let a = sessions.create(1).await.unwrap();
        let b = sessions.create(1).await.unwrap();
        assert_ne!(a, b);
    }
}
