//! Queue capacity planning.
//!
//! The capacity of an event's waiting room is derived from the inventory
//! left in the event's country and cohort and memoized in the
//! [`CapacityCache`]. The cached value is expendable: when the cache cannot
//! be read it is recomputed, and a failed write only costs a recomputation
//! on the next admission.

use crate::metrics;
use crate::policy::SalesPolicy;
use chrono::{DateTime, Utc};
use fairqueue_core::error::{Result, SalesError};
use fairqueue_core::providers::{CapacityCache, ChannelScope, TicketRepository};
use fairqueue_core::types::{CohortTag, Event, EventId};

/// Where a queue limit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSource {
    /// Read from the capacity cache.
    Cached,
    /// Aggregated from inventory on a cache miss.
    Computed,
}

/// Queue capacity for one (event, cohort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueLimit {
    /// Highest admissible queue number.
    pub limit: u64,
    /// Cache hit or fresh computation.
    pub source: LimitSource,
}

/// Cache key for an event's capacity within a cohort.
#[must_use]
pub fn capacity_key(event_id: &EventId, tag: &CohortTag) -> String {
    format!("ORDER:QUEUE-LIMIT:{event_id}:{tag}")
}

/// Resolve the queue limit for `event`.
///
/// # Errors
///
/// - [`SalesError::InvalidCachedCapacity`] if the cached value is not an
///   integer (it is not recomputed).
/// - [`SalesError::InventoryNotFound`] if no ticket class exists for the
///   event's country and tag.
/// - [`SalesError::Store`] if the inventory aggregate fails.
pub async fn queue_limit<T, C>(
    tickets: &T,
    cache: &C,
    policy: &SalesPolicy,
    event: &Event,
    now: DateTime<Utc>,
) -> Result<QueueLimit>
where
    T: TicketRepository,
    C: CapacityCache,
{
    let key = capacity_key(&event.event_id, &event.tag);

    match cache.get(&key).await {
        Ok(Some(raw)) => {
            metrics::record_capacity_lookup("hit");
            let limit = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| SalesError::InvalidCachedCapacity(raw.clone()))?;
            return Ok(QueueLimit {
                limit,
                source: LimitSource::Cached,
            });
        }
        Ok(None) => metrics::record_capacity_lookup("miss"),
        Err(e) => {
            metrics::record_capacity_lookup("error");
            tracing::warn!(key = %key, error = %e, "Capacity cache read failed, recomputing");
        }
    }

    let available = tickets
        .sum_remaining(&event.country.code, &event.tag, ChannelScope::AllChannels)
        .await?
        .ok_or(SalesError::InventoryNotFound)?;
    let limit = policy.release_capacity(available, now);

    if let Err(e) = cache.set(&key, &limit.to_string(), policy.capacity_ttl).await {
        tracing::warn!(key = %key, error = %e, "Failed to cache queue capacity");
    }

    tracing::debug!(
        event_id = %event.event_id,
        tag = %event.tag,
        available,
        limit,
        "Computed queue capacity"
    );

    Ok(QueueLimit {
        limit,
        source: LimitSource::Computed,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use fairqueue_core::types::TicketType;
    use fairqueue_testing::{fixtures, test_clock, InMemoryCapacityCache, InMemoryInventoryStore};
    use fairqueue_core::environment::Clock;
    use std::sync::Arc;

    fn setup(remaining: u64) -> (InMemoryInventoryStore, Event) {
        let store = InMemoryInventoryStore::new();
        let event = fixtures::event("E1", "ID", "T1");
        store.insert_event(event.clone());
        store.insert_ticket_class(fixtures::ticket_class(&event, TicketType::Gold, 100, remaining));
        (store, event)
    }

    #[test]
    fn key_format() {
        assert_eq!(
            capacity_key(&EventId::new("E1"), &CohortTag::new("T1")),
            "ORDER:QUEUE-LIMIT:E1:T1"
        );
    }

    #[tokio::test]
    async fn miss_computes_and_caches() {
        let clock = test_clock();
        let (store, event) = setup(40);
        let cache = InMemoryCapacityCache::new(Arc::new(clock.clone()));
        let policy = SalesPolicy::default();

        let first = queue_limit(&store, &cache, &policy, &event, clock.now()).await.unwrap();
        assert_eq!(first, QueueLimit { limit: 10, source: LimitSource::Computed });
        assert_eq!(cache.peek("ORDER:QUEUE-LIMIT:E1:T1").as_deref(), Some("10"));

        // Inventory changes are not seen until the entry expires.
        store.set_remaining(&fixtures::class_id(&event, TicketType::Gold), 4);
        let second = queue_limit(&store, &cache, &policy, &event, clock.now()).await.unwrap();
        assert_eq!(second, QueueLimit { limit: 10, source: LimitSource::Cached });
        assert_eq!(store.call_count("sum_remaining"), 1);

        clock.advance(chrono::Duration::days(121));
        let third = queue_limit(&store, &cache, &policy, &event, clock.now()).await.unwrap();
        assert_eq!(third.source, LimitSource::Computed);
        assert_eq!(store.call_count("sum_remaining"), 2);
    }

    #[tokio::test]
    async fn garbage_in_cache_is_an_internal_error() {
        let clock = test_clock();
        let (store, event) = setup(40);
        let cache = InMemoryCapacityCache::new(Arc::new(clock.clone()));
        cache.insert_raw("ORDER:QUEUE-LIMIT:E1:T1", "lots");

        let err = queue_limit(&store, &cache, &SalesPolicy::default(), &event, clock.now())
            .await
            .unwrap_err();
        assert_eq!(err, SalesError::InvalidCachedCapacity("lots".to_string()));
        assert!(!err.is_client_error());
        assert_eq!(store.call_count("sum_remaining"), 0);
    }

    #[tokio::test]
    async fn cache_outage_falls_back_to_inventory() {
        let clock = test_clock();
        let (store, event) = setup(40);
        let cache = InMemoryCapacityCache::new(Arc::new(clock.clone()));
        cache.set_unavailable(true);

        let limit = queue_limit(&store, &cache, &SalesPolicy::default(), &event, clock.now())
            .await
            .unwrap();
        assert_eq!(limit.limit, 10);
    }

    #[tokio::test]
    async fn missing_inventory_is_not_cached() {
        let clock = test_clock();
        let store = InMemoryInventoryStore::new();
        let event = fixtures::event("E1", "ID", "T1");
        let cache = InMemoryCapacityCache::new(Arc::new(clock.clone()));

        let err = queue_limit(&store, &cache, &SalesPolicy::default(), &event, clock.now())
            .await
            .unwrap_err();
        assert_eq!(err, SalesError::InventoryNotFound);
        assert_eq!(cache.set_count(), 0);
    }
}
