//! Domain-level error types.

use thiserror::Error;

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// Failures of the atomic vote transaction.
///
/// Every variant means the transaction was rolled back in full: the ledger
/// and the score aggregate are never left disagreeing.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error("post {0} not found")]
    PostNotFound(i64),

    /// A concurrent vote on the same (user, post) pair won the race and the
    /// retry could not resolve it either.
    #[error("conflicting vote in flight for post {0}")]
    Contended(i64),

    #[error("vote transaction failed: {0}")]
    Transaction(String),
}
