//! Database connection management and Postgres implementations.

mod connections;
pub mod entity;
mod postgres_repo;
mod voting;

pub use connections::{DatabaseConfig, connect};
pub use postgres_repo::{PostgresPostRepository, PostgresUserRepository};
pub use voting::PgVotingEngine;

#[cfg(test)]
mod tests;
