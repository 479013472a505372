//! Shared harness for engine integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, TimeZone, Utc};
use fairqueue_core::{Event, EventId, TicketClassId, TicketType, UserId};
use fairqueue_engine::{
    Admission, AdmissionController, AllocationEngine, AllocationRequest, OrderHistory,
    SalesEnvironment, SalesPolicy,
};
use fairqueue_testing::{
    FixedClock, InMemoryCapacityCache, InMemoryInventoryStore, fixtures, test_clock,
};
use std::sync::Arc;

pub type Store = InMemoryInventoryStore;
pub type MemoryEnv = SalesEnvironment<Store, Store, Store, Store, InMemoryCapacityCache>;

/// One event ("E1", country ID, cohort T1) over in-memory stores and a
/// fixed clock (Saturday 2025-03-01, first quarter).
pub struct Harness {
    pub store: Store,
    pub cache: InMemoryCapacityCache,
    pub clock: FixedClock,
    pub event: Event,
    pub policy: SalesPolicy,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(SalesPolicy::default())
    }

    pub fn with_policy(policy: SalesPolicy) -> Self {
        let clock = test_clock();
        let store = Store::new();
        let cache = InMemoryCapacityCache::new(Arc::new(clock.clone()));
        let event = fixtures::event("E1", "ID", "T1");
        store.insert_event(event.clone());

        Self {
            store,
            cache,
            clock,
            event,
            policy,
        }
    }

    /// Move the clock into the fourth quarter (Saturday 2025-11-01).
    pub fn in_peak_quarter(self) -> Self {
        self.clock.set(at(2025, 11, 1, 10));
        self
    }

    pub fn env(&self) -> MemoryEnv {
        SalesEnvironment::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.cache.clone(),
            Arc::new(self.clock.clone()),
        )
    }

    pub fn admission(&self) -> AdmissionController<Store, Store, Store, Store, InMemoryCapacityCache> {
        AdmissionController::new(self.env(), self.policy.clone())
    }

    pub fn allocation(&self) -> AllocationEngine<Store, Store, Store, Store, InMemoryCapacityCache> {
        AllocationEngine::new(self.env(), self.policy.clone())
    }

    pub fn history(&self) -> OrderHistory<Store> {
        OrderHistory::new(self.store.clone(), self.policy.clone())
    }

    pub fn event_id(&self) -> &EventId {
        &self.event.event_id
    }

    /// Add a class for `ticket_type` with `remaining` units and as many slips.
    pub fn stock(&self, ticket_type: TicketType, price: u64, remaining: u32) -> TicketClassId {
        self.stock_with_slips(ticket_type, price, u64::from(remaining), remaining)
    }

    /// Add a class whose counter and slip count differ.
    pub fn stock_with_slips(
        &self,
        ticket_type: TicketType,
        price: u64,
        remaining: u64,
        slips: u32,
    ) -> TicketClassId {
        let class = fixtures::ticket_class(&self.event, ticket_type, price, remaining);
        let id = class.ticket_id.clone();
        self.store.insert_ticket_class(class);
        self.store
            .insert_slips(fixtures::slips(&self.event, ticket_type, slips));
        id
    }

    /// Register a buyer resident in `country`.
    pub fn buyer(&self, id: &str, country: &str) -> UserId {
        self.store.insert_user(fixtures::user(id, country));
        UserId::new(id)
    }

    /// Register a buyer and queue them at `position` without going through
    /// admission.
    pub fn queued_buyer(&self, id: &str, country: &str, position: u64) -> UserId {
        let user = self.buyer(id, country);
        self.store
            .insert_queue_entry_raw(fixtures::queue_entry(&self.event, id, position));
        user
    }

    pub async fn admit(&self, user: &UserId) -> Admission {
        self.admission()
            .request_admission(self.event_id(), user)
            .await
            .expect("admission should succeed")
    }

    pub fn request(&self, user: &UserId, ticket_type: TicketType) -> AllocationRequest {
        AllocationRequest::new(self.event_id().clone(), user.clone(), ticket_type)
    }

    pub fn remaining(&self, ticket_id: &TicketClassId) -> u64 {
        self.store.ticket_class(ticket_id).unwrap().total_remaining
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}
