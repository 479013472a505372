//! Error types for admission and allocation.

use chrono::Weekday;
use thiserror::Error;

/// Result type alias for admission and allocation operations.
pub type Result<T> = std::result::Result<T, SalesError>;

/// Every failure an admission or allocation call can end with.
///
/// Client errors carry the reason shown to the buyer. Internal errors are
/// opaque to the buyer; store and cache failures name the operation that
/// produced them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SalesError {
    // ═══════════════════════════════════════════════════════════
    // Request validation
    // ═══════════════════════════════════════════════════════════

    /// Ticket type outside the closed set.
    #[error("invalid ticket type: {0}")]
    InvalidTicketType(String),

    /// Page or size of zero.
    #[error("invalid page request: page {page}, size {size}")]
    InvalidPage {
        /// Requested page
        page: u64,
        /// Requested size
        size: u64,
    },

    /// Sales are restricted to fixed weekdays.
    #[error("sales are closed on {weekday}")]
    SalesClosed {
        /// Weekday of the rejected request
        weekday: Weekday,
    },

    // ═══════════════════════════════════════════════════════════
    // Lookups
    // ═══════════════════════════════════════════════════════════

    /// Event does not exist.
    #[error("event not found")]
    EventNotFound,

    /// Buyer does not exist.
    #[error("user not found")]
    UserNotFound,

    /// No ticket class exists for the requested type.
    #[error("ticket detail not found")]
    TicketClassNotFound,

    /// No inventory is provisioned for the event's country and cohort.
    #[error("country not found")]
    InventoryNotFound,

    /// The buyer has no claimed tickets.
    #[error("order not found")]
    OrdersNotFound,

    // ═══════════════════════════════════════════════════════════
    // Admission
    // ═══════════════════════════════════════════════════════════

    /// The buyer already holds a queue position for the event.
    #[error("user already in the queue")]
    AlreadyQueued,

    /// The queue position would exceed the released capacity.
    #[error("Queue is full")]
    QueueFull {
        /// Position that would have been granted
        position: u64,
        /// Capacity in force
        limit: u64,
    },

    // ═══════════════════════════════════════════════════════════
    // Allocation
    // ═══════════════════════════════════════════════════════════

    /// The buyer was never admitted to the event.
    #[error("user not in the queue")]
    NotInQueue,

    /// The buyer already owns a slip for the event.
    #[error("user already order ticket")]
    AlreadyOrdered,

    /// Online sales open only once physical inventory is gone.
    #[error("offline ticket still ready")]
    OfflineInventoryAvailable {
        /// Physical units still unsold
        remaining: u64,
    },

    /// The ticket class counter is at zero.
    #[error("ticket category sold out")]
    SoldOut,

    /// No unclaimed slip matched the claim.
    #[error("failed to process order")]
    ClaimFailed,

    // ═══════════════════════════════════════════════════════════
    // Internal
    // ═══════════════════════════════════════════════════════════

    /// The cached capacity is not an integer.
    #[error("cannot parse cached capacity: {0:?}")]
    InvalidCachedCapacity(String),

    /// Inventory store operation failed.
    #[error("store error in {operation}: {message}")]
    Store {
        /// Store operation that failed
        operation: &'static str,
        /// Driver message
        message: String,
    },

    /// Capacity cache operation failed.
    #[error("cache error in {operation}: {message}")]
    Cache {
        /// Cache operation that failed
        operation: &'static str,
        /// Driver message
        message: String,
    },

    /// Anything else that should never happen.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SalesError {
    /// Build a store error for `operation`.
    pub fn store(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Store {
            operation,
            message: err.to_string(),
        }
    }

    /// Build a cache error for `operation`.
    pub fn cache(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Cache {
            operation,
            message: err.to_string(),
        }
    }

    /// Returns `true` if the request itself was invalid or ineligible.
    ///
    /// # Examples
    ///
    /// ```
    /// # use fairqueue_core::SalesError;
    /// assert!(SalesError::SoldOut.is_client_error());
    /// assert!(!SalesError::Internal("boom".into()).is_client_error());
    /// ```
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::InvalidCachedCapacity(_)
                | Self::Store { .. }
                | Self::Cache { .. }
                | Self::Internal(_)
        )
    }

    /// Short, stable label for metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTicketType(_) => "invalid_ticket_type",
            Self::InvalidPage { .. } => "invalid_page",
            Self::SalesClosed { .. } => "sales_closed",
            Self::EventNotFound => "event_not_found",
            Self::UserNotFound => "user_not_found",
            Self::TicketClassNotFound => "ticket_class_not_found",
            Self::InventoryNotFound => "inventory_not_found",
            Self::OrdersNotFound => "orders_not_found",
            Self::AlreadyQueued => "already_queued",
            Self::QueueFull { .. } => "queue_full",
            Self::NotInQueue => "not_in_queue",
            Self::AlreadyOrdered => "already_ordered",
            Self::OfflineInventoryAvailable { .. } => "offline_inventory_available",
            Self::SoldOut => "sold_out",
            Self::ClaimFailed => "claim_failed",
            Self::InvalidCachedCapacity(_) => "invalid_cached_capacity",
            Self::Store { .. } => "store",
            Self::Cache { .. } => "cache",
            Self::Internal(_) => "internal",
        }
    }
}
