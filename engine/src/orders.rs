//! Claimed-ticket listing.
//!
//! Order history is read straight from the claimed slips; no separate order
//! record exists.

use crate::policy::SalesPolicy;
use chrono::{DateTime, Utc};
use fairqueue_core::error::{Result, SalesError};
use fairqueue_core::providers::TicketRepository;
use fairqueue_core::types::{
    CountryCode, EventId, PageRequest, PaymentStatus, TicketSlip, TicketType, UserId,
};
use serde::{Deserialize, Serialize};

/// One claimed ticket in a buyer's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimedTicket {
    /// Printed ticket number.
    pub ticket_number: String,
    /// Ticket type.
    pub ticket_type: TicketType,
    /// Charged price.
    pub price: u64,
    /// Event.
    pub event_id: EventId,
    /// Country of sale.
    pub country_code: CountryCode,
    /// Payment state.
    pub payment_status: Option<PaymentStatus>,
    /// Claim time.
    pub order_time: DateTime<Utc>,
    /// Payment deadline, only while payment is pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_wait_time: Option<DateTime<Utc>>,
}

/// Paging metadata for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Requested page, starting at 1.
    pub page: u64,
    /// Requested page size.
    pub size: u64,
    /// Matches across all pages.
    pub total_items: u64,
    /// Number of pages of `size` needed for `total_items`.
    pub total_pages: u64,
    /// Items on this page.
    pub items_on_page: u64,
}

impl PageMeta {
    /// Metadata for `items_on_page` items of `total_items` under `request`.
    #[must_use]
    pub const fn new(request: PageRequest, total_items: u64, items_on_page: u64) -> Self {
        Self {
            page: request.page,
            size: request.size,
            total_items,
            total_pages: total_items.div_ceil(request.size),
            items_on_page,
        }
    }
}

/// A page of a buyer's claimed tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimedTickets {
    /// Tickets, newest claim first.
    pub items: Vec<ClaimedTicket>,
    /// Paging metadata.
    pub meta: PageMeta,
}

/// Reads a buyer's claimed tickets.
#[derive(Debug, Clone)]
pub struct OrderHistory<T>
where
    T: TicketRepository + Clone,
{
    tickets: T,
    policy: SalesPolicy,
}

impl<T> OrderHistory<T>
where
    T: TicketRepository + Clone,
{
    /// Create a listing over `tickets`.
    #[must_use]
    pub const fn new(tickets: T, policy: SalesPolicy) -> Self {
        Self { tickets, policy }
    }

    /// List the tickets claimed by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// - [`SalesError::InvalidPage`] if `page` or `size` is zero
    /// - [`SalesError::OrdersNotFound`] if the page is empty
    /// - [`SalesError::Store`] if the read fails
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_claimed_tickets(
        &self,
        user_id: &UserId,
        page: u64,
        size: u64,
    ) -> Result<ClaimedTickets> {
        let request = PageRequest::new(page, size)?;
        let found = self.tickets.list_slips_by_owner(user_id, request).await?;

        if found.items.is_empty() {
            tracing::warn!(total = found.total, "No claimed tickets on page");
            return Err(SalesError::OrdersNotFound);
        }

        let items: Vec<ClaimedTicket> = found
            .items
            .into_iter()
            .map(|slip| self.describe(slip))
            .collect();
        let meta = PageMeta::new(request, found.total, items.len() as u64);

        Ok(ClaimedTickets { items, meta })
    }

    fn describe(&self, slip: TicketSlip) -> ClaimedTicket {
        let max_wait_time = (slip.payment_status == Some(PaymentStatus::Pending))
            .then(|| self.policy.payment_deadline(slip.updated_at));

        ClaimedTicket {
            ticket_number: slip.ticket_number,
            ticket_type: slip.ticket_type,
            price: slip.price,
            event_id: slip.event_id,
            country_code: slip.country_code,
            payment_status: slip.payment_status,
            order_time: slip.updated_at,
            max_wait_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_meta_rounds_pages_up() {
        let meta = PageMeta::new(PageRequest { page: 2, size: 3 }, 7, 3);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.items_on_page, 3);

        let exact = PageMeta::new(PageRequest { page: 1, size: 5 }, 10, 5);
        assert_eq!(exact.total_pages, 2);
    }
}
