//! # Fairqueue Engine
//!
//! Fair allocation of scarce event tickets: a capacity-gated waiting queue
//! followed by an atomic claim of one pre-provisioned ticket slip per buyer.
//!
//! ## Components
//!
//! - **Admission Controller** ([`AdmissionController`]): one queue position
//!   per (event, buyer), bounded by the event's queue capacity
//! - **Capacity planner** ([`capacity`]): derives the capacity from remaining
//!   inventory and memoizes it in the [`CapacityCache`](fairqueue_core::providers::CapacityCache)
//! - **Allocation Engine** ([`AllocationEngine`]): eligibility checks,
//!   pricing and the atomic slip claim
//! - **Order history** ([`OrderHistory`]): a buyer's claimed tickets, paged
//!
//! Every component takes its collaborators through a [`SalesEnvironment`]
//! and its rules from an immutable [`SalesPolicy`].
//!
//! ## Example
//!
//! ```
//! use fairqueue_engine::{
//!     AdmissionController, AllocationEngine, AllocationRequest, SalesEnvironment, SalesPolicy,
//! };
//! use fairqueue_core::{EventId, TicketType, UserId};
//! use fairqueue_testing::{fixtures, test_clock, InMemoryCapacityCache, InMemoryInventoryStore};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let clock = Arc::new(test_clock());
//! let store = InMemoryInventoryStore::new();
//! let event = fixtures::event("E1", "ID", "T1");
//! store.insert_event(event.clone());
//! store.insert_user(fixtures::user("U1", "ID"));
//! store.insert_ticket_class(fixtures::ticket_class(&event, TicketType::Gold, 100, 10));
//! store.insert_slips(fixtures::slips(&event, TicketType::Gold, 10));
//!
//! let env = SalesEnvironment::new(
//!     store.clone(),
//!     store.clone(),
//!     store.clone(),
//!     store.clone(),
//!     InMemoryCapacityCache::new(clock.clone()),
//!     clock,
//! );
//! let admission = AdmissionController::new(env.clone(), SalesPolicy::default());
//! let allocation = AllocationEngine::new(env, SalesPolicy::default());
//!
//! let position = admission
//!     .request_admission(&EventId::new("E1"), &UserId::new("U1"))
//!     .await
//!     .unwrap();
//! assert_eq!(position.queue_number, 1);
//!
//! let ticket = allocation
//!     .allocate_ticket(&AllocationRequest::new("E1", "U1", TicketType::Gold))
//!     .await
//!     .unwrap();
//! assert_eq!(ticket.price, 100);
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod admission;
pub mod allocation;
pub mod capacity;
pub mod config;
pub mod environment;
pub mod metrics;
pub mod orders;
pub mod policy;
pub mod stores;

pub use admission::{Admission, AdmissionController};
pub use allocation::{Allocation, AllocationEngine, AllocationRequest};
pub use capacity::{capacity_key, LimitSource, QueueLimit};
pub use config::Config;
pub use environment::SalesEnvironment;
pub use orders::{ClaimedTicket, ClaimedTickets, OrderHistory, PageMeta};
pub use policy::{Quarter, SalesPolicy};
