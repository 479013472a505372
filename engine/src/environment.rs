//! Sales environment.
//!
//! Every external dependency of the admission controller, the allocation
//! engine and the claimed-ticket listing, injected as one value.

use fairqueue_core::environment::Clock;
use fairqueue_core::providers::{
    CapacityCache, EventRepository, QueueRepository, TicketRepository, UserRepository,
};
use std::sync::Arc;

/// Sales environment.
///
/// # Type Parameters
///
/// - `E`: Event repository
/// - `U`: User repository
/// - `Q`: Queue repository
/// - `T`: Ticket repository
/// - `C`: Capacity cache
///
/// A single store usually implements the four repositories; pass clones of
/// it for each slot.
#[derive(Clone)]
pub struct SalesEnvironment<E, U, Q, T, C>
where
    E: EventRepository + Clone,
    U: UserRepository + Clone,
    Q: QueueRepository + Clone,
    T: TicketRepository + Clone,
    C: CapacityCache + Clone,
{
    /// Event lookups.
    pub events: E,

    /// Buyer lookups.
    pub users: U,

    /// Queue entries and position assignment.
    pub queues: Q,

    /// Ticket classes and slips.
    pub tickets: T,

    /// Capacity cache (`Redis` in production).
    pub cache: C,

    /// Clock for timestamps and calendar decisions.
    pub clock: Arc<dyn Clock>,
}

impl<E, U, Q, T, C> SalesEnvironment<E, U, Q, T, C>
where
    E: EventRepository + Clone,
    U: UserRepository + Clone,
    Q: QueueRepository + Clone,
    T: TicketRepository + Clone,
    C: CapacityCache + Clone,
{
    /// Create a new sales environment.
    #[must_use]
    pub fn new(events: E, users: U, queues: Q, tickets: T, cache: C, clock: Arc<dyn Clock>) -> Self {
        Self {
            events,
            users,
            queues,
            tickets,
            cache,
            clock,
        }
    }
}
