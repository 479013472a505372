//! # Fairqueue Testing
//!
//! Testing utilities for fairqueue.
//!
//! This crate provides:
//! - [`InMemoryInventoryStore`]: every store contract behind one mutex
//! - [`InMemoryCapacityCache`]: TTL cache driven by an injected clock
//! - [`FixedClock`]: deterministic, manually advanced time
//! - [`fixtures`]: builders for events, buyers, classes and slips
//!
//! ## Example
//!
//! ```
//! use fairqueue_testing::{fixtures, InMemoryInventoryStore};
//!
//! let store = InMemoryInventoryStore::new();
//! let event = fixtures::event("evt-1", "ID", "T1");
//! store.insert_event(event.clone());
//! store.insert_ticket_class(fixtures::ticket_class(&event, fairqueue_core::TicketType::Gold, 100, 10));
//! ```

pub mod cache_mocks;
pub mod fixtures;
pub mod inventory_mocks;

/// Mock implementations of Environment traits
pub mod mocks {
    use chrono::{DateTime, Duration, Utc};
    use fairqueue_core::environment::Clock;
    use std::sync::{Arc, PoisonError, RwLock};

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same time until moved with [`FixedClock::set`] or
    /// [`FixedClock::advance`]. Clones share the same instant, so a clock
    /// handed to both an engine and a cache moves for both.
    ///
    /// # Example
    ///
    /// ```
    /// use fairqueue_testing::mocks::FixedClock;
    /// use fairqueue_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// assert_eq!(time1, clock.now()); // Always the same!
    ///
    /// clock.advance(Duration::hours(1));
    /// assert_eq!(clock.now() - time1, Duration::hours(1));
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Jump to `time`
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.write().unwrap_or_else(PoisonError::into_inner) = time;
        }

        /// Move forward by `by`
        pub fn advance(&self, by: Duration) {
            let mut guard = self.time.write().unwrap_or_else(PoisonError::into_inner);
            *guard += by;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.read().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests: Saturday 2025-03-01 10:00 UTC
    /// (first quarter, weekend).
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-03-01T10:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use cache_mocks::InMemoryCapacityCache;
pub use inventory_mocks::InMemoryInventoryStore;
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};
    use fairqueue_core::environment::Clock;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1.weekday(), Weekday::Sat);
    }

    #[test]
    fn clones_share_time() {
        let clock = test_clock();
        let other = clock.clone();
        clock.advance(chrono::Duration::days(1));
        assert_eq!(other.now(), clock.now());
    }
}
