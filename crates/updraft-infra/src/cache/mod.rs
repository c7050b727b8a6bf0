//! Cache implementations - Redis, with an in-memory fallback.
//!
//! The session store rides on this; everything else treats the cache as
//! read-only.

mod memory;
mod redis;

pub use memory::InMemoryCache;
pub use redis::{RedisCache, RedisConfig};
