//! # Updraft Core
//!
//! The domain layer of the Updraft backend.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod feed;
pub mod ports;

pub use error::RepoError;
