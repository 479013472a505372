//! Storage implementations owned by the engine.
//!
//! - **Capacity Cache** (Redis) - Memoized queue capacity with TTL
//!
//! The inventory store lives in `fairqueue-postgres`.

pub mod capacity_redis;

pub use capacity_redis::RedisCapacityCache;
