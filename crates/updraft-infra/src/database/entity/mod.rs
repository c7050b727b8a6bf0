//! SeaORM entities mirroring the persisted schema.

pub mod post;
pub mod updoot;
pub mod user;
