//! Ticket classes and slips.

use crate::error::Result;
use crate::types::{
    CohortTag, CountryCode, EventId, Page, PageRequest, SlipClaim, TicketClass, TicketSlip,
    TicketType, UserId,
};
use std::future::Future;

/// Which ticket classes an inventory sum covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelScope {
    /// Every ticket type.
    AllChannels,
    /// Every ticket type except `Online`.
    ExcludingOnline,
}

impl ChannelScope {
    /// Whether a class of `ticket_type` is counted.
    #[must_use]
    pub const fn includes(&self, ticket_type: TicketType) -> bool {
        match self {
            Self::AllChannels => true,
            Self::ExcludingOnline => !ticket_type.is_online(),
        }
    }
}

/// Result of an atomic slip claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The slip as it reads after the claim.
    Claimed(TicketSlip),
    /// No unclaimed slip matched (event, ticket type).
    NoSlipAvailable,
    /// The class counter was already zero; nothing was written.
    ClassExhausted,
    /// The buyer already owns a slip for the event; nothing was written.
    AlreadyOwned,
}

/// Ticket class counters and the slip free-list.
pub trait TicketRepository: Send + Sync {
    /// Sum `total_remaining` over every class in `country` and `tag`
    /// selected by `scope`.
    ///
    /// Returns `None` when no class matched.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SalesError::Store`] if the aggregate fails.
    fn sum_remaining(
        &self,
        country: &CountryCode,
        tag: &CohortTag,
        scope: ChannelScope,
    ) -> impl Future<Output = Result<Option<u64>>> + Send;

    /// Find the class for (event, ticket type).
    ///
    /// # Errors
    ///
    /// Returns [`crate::SalesError::Store`] if the lookup fails.
    fn find_ticket_class(
        &self,
        event_id: &EventId,
        ticket_type: TicketType,
    ) -> impl Future<Output = Result<Option<TicketClass>>> + Send;

    /// Find a slip already claimed by the buyer for the event.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SalesError::Store`] if the lookup fails.
    fn find_slip_by_owner(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<TicketSlip>>> + Send;

    /// Claim one unclaimed slip and decrement its class counter as a single
    /// atomic unit.
    ///
    /// Either every write happens or none does:
    /// - the buyer must own no slip for the event (`AlreadyOwned`)
    /// - the class counter must be above zero (`ClassExhausted`)
    /// - an unclaimed slip for (event, ticket type) must exist (`NoSlipAvailable`)
    ///
    /// Under N concurrent claims against M unclaimed slips at most M succeed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SalesError::Store`] if the store fails; no partial
    /// claim is left behind.
    fn claim_slip(&self, claim: &SlipClaim) -> impl Future<Output = Result<ClaimOutcome>> + Send;

    /// Slips owned by the buyer, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SalesError::Store`] if the query fails.
    fn list_slips_by_owner(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<TicketSlip>>> + Send;
}
