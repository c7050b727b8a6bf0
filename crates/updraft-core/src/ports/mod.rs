//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod cache;
mod repository;
mod voting;

pub use auth::{AuthError, PasswordService, SessionStore};
pub use cache::{Cache, CacheError};
pub use repository::{PostRepository, UserRepository};
pub use voting::VotingEngine;
