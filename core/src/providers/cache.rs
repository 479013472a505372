//! Expendable key-value cache for derived values.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;

/// Key-value cache with TTL.
///
/// Holds only values that can be recomputed from the inventory store, so an
/// empty or unavailable cache is never a correctness problem.
pub trait CapacityCache: Send + Sync {
    /// Read a value. `None` on miss or expiry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SalesError::Cache`] if the cache is unreachable.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Write a value that expires after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SalesError::Cache`] if the cache is unreachable.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> impl Future<Output = Result<()>> + Send;
}
