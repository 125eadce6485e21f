//! Cache backends for the global feed cache - Redis, in-memory, and a no-op.

mod memory;
mod noop;
#[cfg(feature = "redis")]
mod redis_cache;

pub use memory::InMemoryCache;
pub use noop::NoopCache;
#[cfg(feature = "redis")]
pub use redis_cache::{RedisCache, RedisConfig};
