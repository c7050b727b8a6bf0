//! # Updraft Infrastructure
//!
//! Concrete implementations of the ports defined in `updraft-core`:
//! PostgreSQL repositories and the transactional voting engine via SeaORM,
//! Redis/in-memory caching, Argon2 password hashing, and cache-backed
//! sessions.

pub mod auth;
pub mod cache;
pub mod database;

pub use auth::{Argon2PasswordService, CacheSessionStore};
pub use cache::{InMemoryCache, RedisCache, RedisConfig};
pub use database::{DatabaseConfig, PgVotingEngine, PostgresPostRepository, PostgresUserRepository};
