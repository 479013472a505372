//! Redis-based capacity cache.
//!
//! Plain string values written with `SET key value EX ttl`; an expired or
//! evicted key reads as a miss.

use fairqueue_core::error::{Result, SalesError};
use fairqueue_core::providers::CapacityCache;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;

/// `Redis`-backed [`CapacityCache`].
///
/// # Example
///
/// ```no_run
/// use fairqueue_engine::stores::RedisCapacityCache;
/// use fairqueue_core::providers::CapacityCache;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let cache = RedisCapacityCache::new("redis://127.0.0.1:6379").await?;
///
/// cache.set("ORDER:QUEUE-LIMIT:E1:T1", "250", std::time::Duration::from_secs(3600)).await?;
/// assert_eq!(cache.get("ORDER:QUEUE-LIMIT:E1:T1").await?.as_deref(), Some("250"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisCapacityCache {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisCapacityCache {
    /// Create a new `Redis` capacity cache.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - `Redis` connection URL (e.g., "<redis://127.0.0.1:6379>")
    ///
    /// # Errors
    ///
    /// Returns error if connection to `Redis` fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| SalesError::cache("connect", e))?;

        let conn_manager = ConnectionManager::new(client)
            .await
            .map_err(|e| SalesError::cache("connect", e))?;

        Ok(Self { conn_manager })
    }
}

impl CapacityCache for RedisCapacityCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn_manager.clone();

        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| SalesError::cache("get", e))?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn_manager.clone();

        // SET EX rejects a zero TTL.
        let seconds = ttl.as_secs().max(1);
        let _: () = conn
            .set_ex(key, value, seconds)
            .await
            .map_err(|e| SalesError::cache("set", e))?;

        tracing::debug!(key = %key, ttl_secs = seconds, "Cached queue capacity");

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // Note: These tests require a running Redis instance
    // Run with: docker run -d -p 6379:6379 redis:7-alpine

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn set_then_get_round_trips() {
        let cache = RedisCapacityCache::new("redis://127.0.0.1:6379").await.unwrap();

        cache
            .set("fairqueue:test:capacity", "42", Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(
            cache.get("fairqueue:test:capacity").await.unwrap().as_deref(),
            Some("42")
        );
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn missing_key_is_none() {
        let cache = RedisCapacityCache::new("redis://127.0.0.1:6379").await.unwrap();

        assert_eq!(cache.get("fairqueue:test:absent").await.unwrap(), None);
    }
}
