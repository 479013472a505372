//! Sales policy: the immutable rules both pipelines are configured with.
//!
//! Every calendar decision (sales weekdays, the current quarter) is taken in
//! the policy's UTC offset, not in the host's local time.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Offset, Utc, Weekday};
use fairqueue_core::error::{Result, SalesError};
use fairqueue_core::types::{CountryCode, TicketType};

/// Calendar quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quarter {
    /// January to March
    Q1,
    /// April to June
    Q2,
    /// July to September
    Q3,
    /// October to December
    Q4,
}

impl Quarter {
    /// Quarter containing `month` (1-12). Months past 12 fall in Q4.
    #[must_use]
    pub const fn from_month(month: u32) -> Self {
        match month {
            0..=3 => Self::Q1,
            4..=6 => Self::Q2,
            7..=9 => Self::Q3,
            _ => Self::Q4,
        }
    }

    /// Quarter from its number (1-4).
    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Q1),
            2 => Some(Self::Q2),
            3 => Some(Self::Q3),
            4 => Some(Self::Q4),
            _ => None,
        }
    }
}

/// Admission and allocation rules.
///
/// Built once at startup and shared (read-only) by the admission controller,
/// the allocation engine and the claimed-ticket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesPolicy {
    /// When set, both pipelines only run on these two weekdays.
    pub sales_days: Option<[Weekday; 2]>,

    /// Offset used for weekday and quarter decisions.
    pub utc_offset: FixedOffset,

    /// Discount for buyers resident outside the event's country on
    /// non-online tickets, in percent.
    ///
    /// Default: 20
    pub cross_country_discount_percent: u64,

    /// Outside the peak quarter, queue capacity is the remaining inventory
    /// divided by this (integer division).
    ///
    /// Default: 4
    pub off_peak_release_divisor: u64,

    /// Quarter in which all remaining inventory is released as capacity.
    ///
    /// Default: Q4
    pub peak_quarter: Quarter,

    /// Lifetime of a cached capacity value.
    ///
    /// Default: 120 days
    pub capacity_ttl: std::time::Duration,

    /// How long a pending claim waits for payment.
    ///
    /// Default: 15 minutes
    pub payment_hold: Duration,
}

impl Default for SalesPolicy {
    fn default() -> Self {
        Self {
            sales_days: None,
            utc_offset: Utc.fix(),
            cross_country_discount_percent: 20,
            off_peak_release_divisor: 4,
            peak_quarter: Quarter::Q4,
            capacity_ttl: std::time::Duration::from_secs(4 * 30 * 24 * 60 * 60),
            payment_hold: Duration::minutes(15),
        }
    }
}

impl SalesPolicy {
    /// Restrict sales to two weekdays.
    #[must_use]
    pub const fn with_sales_days(mut self, first: Weekday, second: Weekday) -> Self {
        self.sales_days = Some([first, second]);
        self
    }

    /// Take calendar decisions in `offset`.
    #[must_use]
    pub const fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Set the cross-country discount.
    #[must_use]
    pub const fn with_discount_percent(mut self, percent: u64) -> Self {
        self.cross_country_discount_percent = percent;
        self
    }

    /// Set the off-peak release divisor.
    #[must_use]
    pub const fn with_release_divisor(mut self, divisor: u64) -> Self {
        self.off_peak_release_divisor = divisor;
        self
    }

    /// Set the peak quarter.
    #[must_use]
    pub const fn with_peak_quarter(mut self, quarter: Quarter) -> Self {
        self.peak_quarter = quarter;
        self
    }

    /// Set the capacity cache TTL.
    #[must_use]
    pub const fn with_capacity_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.capacity_ttl = ttl;
        self
    }

    /// Set the payment hold window.
    #[must_use]
    pub const fn with_payment_hold(mut self, hold: Duration) -> Self {
        self.payment_hold = hold;
        self
    }

    /// `now` in the policy's offset.
    #[must_use]
    pub fn local(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.utc_offset)
    }

    /// Reject requests outside the configured sales weekdays.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::SalesClosed`] when a weekday gate is configured
    /// and `now` falls outside it.
    pub fn check_sales_window(&self, now: DateTime<Utc>) -> Result<()> {
        let Some(days) = self.sales_days else {
            return Ok(());
        };

        let weekday = self.local(now).weekday();
        if days.contains(&weekday) {
            Ok(())
        } else {
            Err(SalesError::SalesClosed { weekday })
        }
    }

    /// Quarter `now` falls in.
    #[must_use]
    pub fn quarter_at(&self, now: DateTime<Utc>) -> Quarter {
        Quarter::from_month(self.local(now).month())
    }

    /// Queue capacity released from `available` remaining units.
    ///
    /// All of it during the peak quarter, `available / divisor` otherwise.
    #[must_use]
    pub fn release_capacity(&self, available: u64, now: DateTime<Utc>) -> u64 {
        if self.quarter_at(now) == self.peak_quarter {
            available
        } else {
            available / self.off_peak_release_divisor.max(1)
        }
    }

    /// Price a ticket for a buyer.
    ///
    /// Cross-country buyers get the discount on every type except `Online`.
    /// Integer arithmetic, truncating.
    #[must_use]
    pub fn price_for(
        &self,
        base_price: u64,
        buyer_country: &CountryCode,
        event_country: &CountryCode,
        ticket_type: TicketType,
    ) -> u64 {
        if buyer_country == event_country || ticket_type.is_online() {
            return base_price;
        }
        let keep = 100 - self.cross_country_discount_percent.min(100);
        base_price.saturating_mul(keep) / 100
    }

    /// When a pending claim made at `claimed_at` stops waiting for payment.
    #[must_use]
    pub fn payment_deadline(&self, claimed_at: DateTime<Utc>) -> DateTime<Utc> {
        claimed_at
            .checked_add_signed(self.payment_hold)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
