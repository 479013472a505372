//! Domain types for fair ticket admission and allocation.
//!
//! Identifiers issued by other services (events, users, ticket classes) are
//! opaque strings; identifiers minted here (queue entries) are UUIDs.

use crate::error::SalesError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Create a `", stringify!($name), "` from any string-like value")]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw value
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of an event (owned by the event catalogue)
    EventId
);
string_id!(
    /// Identifier of a buyer (owned by the user service)
    UserId
);
string_id!(
    /// Identifier of a ticket class (one per event and ticket type)
    TicketClassId
);
string_id!(
    /// ISO country code used for residency pricing and inventory partitioning
    CountryCode
);
string_id!(
    /// Sales cohort label partitioning inventory and capacity policy
    CohortTag
);

/// Unique identifier for a queue entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueId(Uuid);

impl QueueId {
    /// Creates a new random `QueueId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `QueueId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for QueueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Ticket type (sales channel / seating tier).
///
/// `Online` is the distinguished channel: it only opens once every other
/// class in the same country and cohort is depleted, and it never receives
/// the cross-country discount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketType {
    /// Front-row tier
    Diamond,
    /// Premium tier
    Platinum,
    /// Upper-middle tier
    Gold,
    /// Middle tier
    Silver,
    /// Entry tier
    Bronze,
    /// Remote attendance
    Online,
}

impl TicketType {
    /// All ticket types, physical tiers first.
    pub const ALL: [Self; 6] = [
        Self::Diamond,
        Self::Platinum,
        Self::Gold,
        Self::Silver,
        Self::Bronze,
        Self::Online,
    ];

    /// Stored representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Diamond => "Diamond",
            Self::Platinum => "Platinum",
            Self::Gold => "Gold",
            Self::Silver => "Silver",
            Self::Bronze => "Bronze",
            Self::Online => "Online",
        }
    }

    /// Whether this is the online sales channel
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketType {
    type Err = SalesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SalesError::InvalidTicketType(s.to_string()))
    }
}

/// Payment state of a claimed slip.
///
/// Claims are always written as `Pending`; the other states are set by the
/// payment service and only read here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Claimed, awaiting payment
    Pending,
    /// Payment confirmed
    Paid,
    /// Payment window lapsed
    Expired,
}

impl PaymentStatus {
    /// Stored representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Expired => "Expired",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = SalesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Expired" => Ok(Self::Expired),
            other => Err(SalesError::Internal(format!("unknown payment status: {other}"))),
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// Country descriptor shared by events, buyers and ticket classes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Display name
    pub name: String,
    /// ISO code
    pub code: CountryCode,
    /// City
    pub city: String,
    /// Venue or place name
    pub place: String,
}

impl Country {
    /// Country with only a code set
    #[must_use]
    pub fn with_code(code: impl Into<CountryCode>) -> Self {
        Self {
            name: String::new(),
            code: code.into(),
            city: String::new(),
            place: String::new(),
        }
    }
}

/// An event on sale. Read-only here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub event_id: EventId,
    /// Display name
    pub name: String,
    /// Home country of the event
    pub country: Country,
    /// Sales cohort
    pub tag: CohortTag,
    /// Scheduled start
    pub date_time: DateTime<Utc>,
    /// Free-form description
    pub description: String,
}

/// A buyer. Read-only here; only the residency country matters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub user_id: UserId,
    /// Full name
    pub full_name: String,
    /// Contact email
    pub email: String,
    /// Residency
    pub country: Country,
}

/// Inventory counter for one ticket type of one event.
///
/// Invariant: `total_remaining <= total_quota`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketClass {
    /// Class identifier
    pub ticket_id: TicketClassId,
    /// Owning event
    pub event_id: EventId,
    /// Ticket type of this class
    pub ticket_type: TicketType,
    /// Base price in minor currency units
    pub price: u64,
    /// Provisioned quota
    pub total_quota: u64,
    /// Units not yet claimed
    pub total_remaining: u64,
    /// Country the class is sold in
    pub country: Country,
    /// Sales cohort
    pub tag: CohortTag,
}

impl TicketClass {
    /// Whether no units remain
    #[must_use]
    pub const fn is_sold_out(&self) -> bool {
        self.total_remaining == 0
    }
}

/// One pre-provisioned sellable unit ("bank ticket").
///
/// Unclaimed slips have `is_used == false` and no owner. Claiming sets the
/// owner fields exactly once; a claimed slip is never released here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSlip {
    /// Printed ticket number
    pub ticket_number: String,
    /// Seat number
    pub seat_number: u32,
    /// Claimed flag
    pub is_used: bool,
    /// Owner, once claimed
    pub user_id: Option<UserId>,
    /// Queue entry the claim was made under
    pub queue_id: Option<QueueId>,
    /// Ticket class the claim was charged against
    pub ticket_id: Option<TicketClassId>,
    /// Event the slip belongs to
    pub event_id: EventId,
    /// Country of sale
    pub country_code: CountryCode,
    /// Charged price (0 until claimed)
    pub price: u64,
    /// Ticket type of the slip
    pub ticket_type: TicketType,
    /// Payment state, once claimed
    pub payment_status: Option<PaymentStatus>,
    /// Provisioning time
    pub created_at: DateTime<Utc>,
    /// Last transition time
    pub updated_at: DateTime<Utc>,
}

impl TicketSlip {
    /// An unclaimed slip as provisioned out of band
    #[must_use]
    pub fn unclaimed(
        ticket_number: impl Into<String>,
        seat_number: u32,
        event_id: EventId,
        ticket_type: TicketType,
        country_code: CountryCode,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ticket_number: ticket_number.into(),
            seat_number,
            is_used: false,
            user_id: None,
            queue_id: None,
            ticket_id: None,
            event_id,
            country_code,
            price: 0,
            ticket_type,
            payment_status: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Whether the slip has an owner
    #[must_use]
    pub const fn is_claimed(&self) -> bool {
        self.is_used
    }

    /// Apply a claim, moving the slip from unclaimed to owned
    pub fn apply_claim(&mut self, claim: &SlipClaim) {
        self.is_used = true;
        self.user_id = Some(claim.user_id.clone());
        self.queue_id = Some(claim.queue_id);
        self.ticket_id = Some(claim.ticket_id.clone());
        self.country_code = claim.country_code.clone();
        self.price = claim.price;
        self.payment_status = Some(claim.payment_status);
        self.updated_at = claim.claimed_at;
    }
}

/// A buyer's position in an event's waiting room. Created once per
/// (event, user) and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Entry identifier
    pub queue_id: QueueId,
    /// Admitted buyer
    pub user_id: UserId,
    /// Event
    pub event_id: EventId,
    /// Position, unique and increasing per event
    pub queue_number: u64,
    /// Event's country at admission time
    pub country_code: CountryCode,
    /// Admission time
    pub created_at: DateTime<Utc>,
    /// Last update
    pub updated_at: DateTime<Utc>,
}

/// A queue entry before the store has assigned its position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingEntry {
    /// Entry identifier
    pub queue_id: QueueId,
    /// Buyer asking to be admitted
    pub user_id: UserId,
    /// Event
    pub event_id: EventId,
    /// Event's country at admission time
    pub country_code: CountryCode,
    /// Admission time
    pub requested_at: DateTime<Utc>,
}

impl PendingEntry {
    /// The persisted entry at `queue_number`
    #[must_use]
    pub fn at_position(&self, queue_number: u64) -> QueueEntry {
        QueueEntry {
            queue_id: self.queue_id,
            user_id: self.user_id.clone(),
            event_id: self.event_id.clone(),
            queue_number,
            country_code: self.country_code.clone(),
            created_at: self.requested_at,
            updated_at: self.requested_at,
        }
    }
}

/// Everything the store needs to claim one slip atomically
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlipClaim {
    /// Event to claim in
    pub event_id: EventId,
    /// Ticket type to claim
    pub ticket_type: TicketType,
    /// Class whose counter is decremented
    pub ticket_id: TicketClassId,
    /// Claimant
    pub user_id: UserId,
    /// Claimant's queue entry
    pub queue_id: QueueId,
    /// Final price
    pub price: u64,
    /// Country of sale
    pub country_code: CountryCode,
    /// Status written on the slip
    pub payment_status: PaymentStatus,
    /// Claim time
    pub claimed_at: DateTime<Utc>,
}

// ============================================================================
// Paging
// ============================================================================

/// 1-based page request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number, starting at 1
    pub page: u64,
    /// Page size
    pub size: u64,
}

impl PageRequest {
    /// Validate and build a page request.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::InvalidPage`] if `page` or `size` is zero.
    pub fn new(page: u64, size: u64) -> Result<Self, SalesError> {
        if page == 0 || size == 0 {
            return Err(SalesError::InvalidPage { page, size });
        }
        Ok(Self { page, size })
    }

    /// Number of items skipped before this page
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.size)
    }
}

/// One page of results plus the total match count
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Items matching across all pages
    pub total: u64,
}
