//! Admission controller.
//!
//! Grants each buyer exactly one queue position per event, bounded by the
//! event's queue capacity. The store assigns the position (highest persisted
//! number plus one) and writes the entry in one atomic step. Concurrent
//! requests never share a position, and a refused request takes none.

use crate::capacity;
use crate::environment::SalesEnvironment;
use crate::metrics;
use crate::policy::SalesPolicy;
use chrono::{DateTime, Utc};
use fairqueue_core::error::{Result, SalesError};
use fairqueue_core::providers::{
    CapacityCache, EventRepository, QueueInsert, QueueRepository, TicketRepository, UserRepository,
};
use fairqueue_core::types::{CountryCode, EventId, PendingEntry, QueueEntry, QueueId, UserId};
use serde::{Deserialize, Serialize};

/// A granted queue position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admission {
    /// Queue entry id, presented again at allocation.
    pub queue_id: QueueId,
    /// Admitted buyer.
    pub user_id: UserId,
    /// Event.
    pub event_id: EventId,
    /// Position in the event's queue.
    pub queue_number: u64,
    /// Event's country.
    pub country_code: CountryCode,
    /// Admission time.
    pub created_at: DateTime<Utc>,
}

impl From<QueueEntry> for Admission {
    fn from(entry: QueueEntry) -> Self {
        Self {
            queue_id: entry.queue_id,
            user_id: entry.user_id,
            event_id: entry.event_id,
            queue_number: entry.queue_number,
            country_code: entry.country_code,
            created_at: entry.created_at,
        }
    }
}

/// Admission controller.
#[derive(Clone)]
pub struct AdmissionController<E, U, Q, T, C>
where
    E: EventRepository + Clone,
    U: UserRepository + Clone,
    Q: QueueRepository + Clone,
    T: TicketRepository + Clone,
    C: CapacityCache + Clone,
{
    env: SalesEnvironment<E, U, Q, T, C>,
    policy: SalesPolicy,
}

impl<E, U, Q, T, C> AdmissionController<E, U, Q, T, C>
where
    E: EventRepository + Clone,
    U: UserRepository + Clone,
    Q: QueueRepository + Clone,
    T: TicketRepository + Clone,
    C: CapacityCache + Clone,
{
    /// Create a controller over `env` applying `policy`.
    #[must_use]
    pub const fn new(env: SalesEnvironment<E, U, Q, T, C>, policy: SalesPolicy) -> Self {
        Self { env, policy }
    }

    /// The policy this controller applies.
    #[must_use]
    pub const fn policy(&self) -> &SalesPolicy {
        &self.policy
    }

    /// Request a queue position for `user_id` in `event_id`.
    ///
    /// # Errors
    ///
    /// - [`SalesError::SalesClosed`] outside the configured sales weekdays
    /// - [`SalesError::EventNotFound`] for an unknown event
    /// - [`SalesError::AlreadyQueued`] if the buyer already holds a position
    /// - [`SalesError::InventoryNotFound`] if the event's country and tag
    ///   have no ticket classes to size the queue from
    /// - [`SalesError::QueueFull`] once the position exceeds the capacity
    /// - [`SalesError::InvalidCachedCapacity`], [`SalesError::Store`] on
    ///   internal failures
    #[tracing::instrument(skip_all, fields(event_id = %event_id, user_id = %user_id))]
    pub async fn request_admission(&self, event_id: &EventId, user_id: &UserId) -> Result<Admission> {
        let result = self.admit(event_id, user_id).await;

        match &result {
            Ok(admission) => {
                tracing::info!(
                    queue_id = %admission.queue_id,
                    queue_number = admission.queue_number,
                    "Buyer admitted"
                );
                metrics::record_admission_granted(admission.queue_number);
            }
            Err(e) => {
                tracing::warn!(reason = e.kind(), error = %e, "Admission rejected");
                metrics::record_admission_rejected(e.kind());
            }
        }

        result
    }

    async fn admit(&self, event_id: &EventId, user_id: &UserId) -> Result<Admission> {
        let now = self.env.clock.now();
        self.policy.check_sales_window(now)?;

        let event = self
            .env
            .events
            .find_event(event_id)
            .await?
            .ok_or(SalesError::EventNotFound)?;

        if self
            .env
            .queues
            .find_queue_entry(event_id, user_id)
            .await?
            .is_some()
        {
            return Err(SalesError::AlreadyQueued);
        }

        let limit =
            capacity::queue_limit(&self.env.tickets, &self.env.cache, &self.policy, &event, now)
                .await?;

        let pending = PendingEntry {
            queue_id: QueueId::new(),
            user_id: user_id.clone(),
            event_id: event_id.clone(),
            country_code: event.country.code.clone(),
            requested_at: now,
        };

        match self.env.queues.enqueue(&pending, limit.limit).await? {
            QueueInsert::Inserted(entry) => Ok(Admission::from(entry)),
            QueueInsert::AlreadyQueued => Err(SalesError::AlreadyQueued),
            QueueInsert::Full { position } => Err(SalesError::QueueFull {
                position,
                limit: limit.limit,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fairqueue_core::environment::Clock;
    use fairqueue_testing::{fixtures, test_clock};

    #[test]
    fn admission_serializes_camel_case() {
        let event = fixtures::event("E1", "ID", "T1");
        let entry = fixtures::queue_entry(&event, "U1", 3);
        let queue_id = entry.queue_id;

        let json = serde_json::to_value(Admission::from(entry)).unwrap();
        assert_eq!(json["queueId"], queue_id.to_string());
        assert_eq!(json["queueNumber"], 3);
        assert_eq!(json["countryCode"], "ID");
        assert_eq!(json["userId"], "U1");
        assert_eq!(
            json["createdAt"],
            serde_json::to_value(test_clock().now()).unwrap()
        );
    }
}
