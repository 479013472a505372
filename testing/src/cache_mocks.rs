//! In-memory capacity cache.

use chrono::{DateTime, Duration, Utc};
use fairqueue_core::environment::Clock;
use fairqueue_core::error::{Result, SalesError};
use fairqueue_core::providers::CapacityCache;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Entries {
    values: HashMap<String, (String, DateTime<Utc>)>,
    gets: usize,
    sets: usize,
    unavailable: bool,
}

/// In-memory TTL cache for testing.
///
/// Expiry is evaluated against the injected clock, so tests can step past a
/// TTL with `FixedClock::advance`. **Production**: use `RedisCapacityCache`.
#[derive(Clone)]
pub struct InMemoryCapacityCache {
    entries: Arc<Mutex<Entries>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCapacityCache {
    /// Create an empty cache reading time from `clock`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Entries::default())),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a raw value with no expiry
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.lock()
            .values
            .insert(key.to_string(), (value.to_string(), DateTime::<Utc>::MAX_UTC));
    }

    /// Simulate an outage: every call fails until restored
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Live value for `key`, if any
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        self.lock()
            .values
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(value, _)| value.clone())
    }

    /// Number of `get` calls
    #[must_use]
    pub fn get_count(&self) -> usize {
        self.lock().gets
    }

    /// Number of `set` calls
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.lock().sets
    }
}

impl std::fmt::Debug for InMemoryCapacityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCapacityCache")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl CapacityCache for InMemoryCapacityCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now();
        let mut entries = self.lock();
        entries.gets += 1;
        if entries.unavailable {
            return Err(SalesError::cache("get", "cache unavailable"));
        }

        let expired = entries
            .values
            .get(key)
            .is_some_and(|(_, expires_at)| *expires_at <= now);
        if expired {
            entries.values.remove(key);
        }

        Ok(entries.values.get(key).map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: std::time::Duration) -> Result<()> {
        let now = self.clock.now();
        let mut entries = self.lock();
        entries.sets += 1;
        if entries.unavailable {
            return Err(SalesError::cache("set", "cache unavailable"));
        }

        let ttl = Duration::from_std(ttl).unwrap_or(Duration::MAX);
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        entries
            .values
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }
}
