//! Authentication ports.

use async_trait::async_trait;

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Session store - maps opaque session tokens to user ids.
///
/// Sessions live in the cache with a TTL; the HTTP layer resolves the token
/// into a user id before any domain operation runs.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session for a user and return its opaque token.
    async fn create(&self, user_id: i64) -> Result<String, AuthError>;

    /// Resolve a token to a user id, or `None` for unknown/expired tokens.
    async fn resolve(&self, token: &str) -> Result<Option<i64>, AuthError>;

    /// Destroy a session. Destroying an unknown token is not an error.
    async fn destroy(&self, token: &str) -> Result<(), AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Session backend failed: {0}")]
    SessionBackend(String),

    #[error("Hashing error: {0}")]
    HashingError(String),
}
