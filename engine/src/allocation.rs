//! Allocation engine.
//!
//! Turns an admitted queue position into exactly one claimed ticket slip.
//! The eligibility checks run in a fixed order and fail fast; the claim
//! itself (slip transition plus class decrement) is a single atomic store
//! operation, which is what keeps concurrent buyers from double-spending a
//! class or a buyer from owning two slips for one event.

use crate::environment::SalesEnvironment;
use crate::metrics;
use crate::policy::SalesPolicy;
use chrono::{DateTime, Utc};
use fairqueue_core::error::{Result, SalesError};
use fairqueue_core::providers::{
    CapacityCache, ChannelScope, ClaimOutcome, EventRepository, QueueRepository, TicketRepository,
    UserRepository,
};
use fairqueue_core::types::{
    CountryCode, EventId, PaymentStatus, QueueId, SlipClaim, TicketSlip, TicketType, UserId,
};
use serde::{Deserialize, Serialize};

/// A request to claim one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    /// Event to buy for.
    pub event_id: EventId,
    /// Buyer, who must already be queued for the event.
    pub user_id: UserId,
    /// Requested ticket type.
    pub ticket_type: TicketType,
}

impl AllocationRequest {
    /// Create a request.
    #[must_use]
    pub fn new(event_id: impl Into<EventId>, user_id: impl Into<UserId>, ticket_type: TicketType) -> Self {
        Self {
            event_id: event_id.into(),
            user_id: user_id.into(),
            ticket_type,
        }
    }
}

/// A claimed ticket, as returned to the buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// Printed ticket number of the claimed slip.
    pub ticket_number: String,
    /// Queue entry the claim was made under.
    pub queue_id: QueueId,
    /// Owner.
    pub user_id: UserId,
    /// Event.
    pub event_id: EventId,
    /// Ticket type.
    pub ticket_type: TicketType,
    /// Country of sale.
    pub country_code: CountryCode,
    /// Charged price.
    pub price: u64,
    /// Payment state (always pending right after a claim).
    pub payment_status: PaymentStatus,
    /// Claim time.
    pub order_time: DateTime<Utc>,
}

impl TryFrom<TicketSlip> for Allocation {
    type Error = SalesError;

    fn try_from(slip: TicketSlip) -> Result<Self> {
        let (Some(user_id), Some(queue_id), Some(payment_status)) =
            (slip.user_id, slip.queue_id, slip.payment_status)
        else {
            return Err(SalesError::Internal(format!(
                "slip {} is not claimed",
                slip.ticket_number
            )));
        };

        Ok(Self {
            ticket_number: slip.ticket_number,
            queue_id,
            user_id,
            event_id: slip.event_id,
            ticket_type: slip.ticket_type,
            country_code: slip.country_code,
            price: slip.price,
            payment_status,
            order_time: slip.updated_at,
        })
    }
}

/// Allocation engine.
#[derive(Clone)]
pub struct AllocationEngine<E, U, Q, T, C>
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

impl<E, U, Q, T, C> AllocationEngine<E, U, Q, T, C>
where
    E: EventRepository + Clone,
    U: UserRepository + Clone,
    Q: QueueRepository + Clone,
    T: TicketRepository + Clone,
    C: CapacityCache + Clone,
{
    /// Create an engine over `env` applying `policy`.
    #[must_use]
    pub const fn new(env: SalesEnvironment<E, U, Q, T, C>, policy: SalesPolicy) -> Self {
        Self { env, policy }
    }

    /// Claim one ticket of the requested type for a queued buyer.
    ///
    /// # Errors
    ///
    /// Client errors, in the order they are checked:
    /// - [`SalesError::SalesClosed`]
    /// - [`SalesError::EventNotFound`]
    /// - [`SalesError::NotInQueue`]
    /// - [`SalesError::AlreadyOrdered`]
    /// - [`SalesError::InventoryNotFound`], [`SalesError::OfflineInventoryAvailable`]
    ///   (`Online` requests only)
    /// - [`SalesError::TicketClassNotFound`], [`SalesError::SoldOut`]
    /// - [`SalesError::UserNotFound`]
    /// - [`SalesError::ClaimFailed`] when no unclaimed slip is left
    ///
    /// [`SalesError::Store`] and [`SalesError::Internal`] on internal failures.
    #[tracing::instrument(
        skip_all,
        fields(
            event_id = %request.event_id,
            user_id = %request.user_id,
            ticket_type = %request.ticket_type,
        )
    )]
    pub async fn allocate_ticket(&self, request: &AllocationRequest) -> Result<Allocation> {
        let result = self.allocate(request).await;

        match &result {
            Ok(allocation) => {
                tracing::info!(
                    ticket_number = %allocation.ticket_number,
                    price = allocation.price,
                    "Ticket claimed"
                );
                metrics::record_allocation_claimed(allocation.ticket_type.as_str(), allocation.price);
            }
            Err(e) => {
                tracing::warn!(reason = e.kind(), error = %e, "Allocation rejected");
                metrics::record_allocation_rejected(e.kind());
            }
        }

        result
    }

    async fn allocate(&self, request: &AllocationRequest) -> Result<Allocation> {
        let AllocationRequest {
            event_id,
            user_id,
            ticket_type,
        } = request;
        let ticket_type = *ticket_type;

        self.policy.check_sales_window(self.env.clock.now())?;

        let event = self
            .env
            .events
            .find_event(event_id)
            .await?
            .ok_or(SalesError::EventNotFound)?;

        let entry = self
            .env
            .queues
            .find_queue_entry(event_id, user_id)
            .await?
            .ok_or(SalesError::NotInQueue)?;

        // Fast path only; claim_slip enforces ownership atomically.
        if self
            .env
            .tickets
            .find_slip_by_owner(event_id, user_id)
            .await?
            .is_some()
        {
            return Err(SalesError::AlreadyOrdered);
        }

        if ticket_type.is_online() {
            let offline = self
                .env
                .tickets
                .sum_remaining(&event.country.code, &event.tag, ChannelScope::ExcludingOnline)
                .await?
                .ok_or(SalesError::InventoryNotFound)?;
            if offline > 0 {
                return Err(SalesError::OfflineInventoryAvailable { remaining: offline });
            }
        }

        let class = self
            .env
            .tickets
            .find_ticket_class(event_id, ticket_type)
            .await?
            .ok_or(SalesError::TicketClassNotFound)?;
        if class.is_sold_out() {
            return Err(SalesError::SoldOut);
        }

        let buyer = self
            .env
            .users
            .find_user(user_id)
            .await?
            .ok_or(SalesError::UserNotFound)?;
        let price = self.policy.price_for(
            class.price,
            &buyer.country.code,
            &event.country.code,
            ticket_type,
        );

        let claim = SlipClaim {
            event_id: event_id.clone(),
            ticket_type,
            ticket_id: class.ticket_id,
            user_id: user_id.clone(),
            queue_id: entry.queue_id,
            price,
            country_code: event.country.code,
            payment_status: PaymentStatus::Pending,
            claimed_at: self.env.clock.now(),
        };

        match self.env.tickets.claim_slip(&claim).await? {
            ClaimOutcome::Claimed(slip) => Allocation::try_from(slip),
            ClaimOutcome::NoSlipAvailable => Err(SalesError::ClaimFailed),
            ClaimOutcome::ClassExhausted => Err(SalesError::SoldOut),
            ClaimOutcome::AlreadyOwned => Err(SalesError::AlreadyOrdered),
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
    fn unclaimed_slip_is_not_an_allocation() {
        let event = fixtures::event("E1", "ID", "T1");
        let slip = fixtures::slips(&event, TicketType::Gold, 1).remove(0);

        let err = Allocation::try_from(slip).unwrap_err();
        assert!(matches!(err, SalesError::Internal(_)));
    }

    #[test]
    fn claimed_slip_converts() {
        let event = fixtures::event("E1", "ID", "T1");
        let mut slip = fixtures::slips(&event, TicketType::Gold, 1).remove(0);
        let queue_id = QueueId::new();
        let claimed_at = test_clock().now() + chrono::Duration::minutes(5);
        slip.apply_claim(&SlipClaim {
            event_id: event.event_id.clone(),
            ticket_type: TicketType::Gold,
            ticket_id: fixtures::class_id(&event, TicketType::Gold),
            user_id: UserId::new("U1"),
            queue_id,
            price: 80,
            country_code: event.country.code.clone(),
            payment_status: PaymentStatus::Pending,
            claimed_at,
        });

        let allocation = Allocation::try_from(slip).unwrap();
        assert_eq!(allocation.ticket_number, "E1-Gold-0001");
        assert_eq!(allocation.queue_id, queue_id);
        assert_eq!(allocation.price, 80);
        assert_eq!(allocation.order_time, claimed_at);
        assert_eq!(allocation.payment_status, PaymentStatus::Pending);
    }
}
