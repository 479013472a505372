//! Row types and conversions between `PostgreSQL` columns and domain types.
//!
//! Counters and prices are `BIGINT` in the database and `u64` in the domain;
//! a negative value read back is reported as an internal error.

use chrono::{DateTime, Utc};
use fairqueue_core::error::{Result, SalesError};
use fairqueue_core::types::{
    CohortTag, Country, CountryCode, Event, EventId, PaymentStatus, QueueEntry, QueueId,
    TicketClass, TicketClassId, TicketSlip, TicketType, User, UserId,
};
use uuid::Uuid;

/// Convert a domain counter to a column value.
pub(crate) fn to_db(operation: &'static str, value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|e| SalesError::store(operation, e))
}

/// Convert a column value to a domain counter.
pub(crate) fn from_db(column: &str, value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| SalesError::Internal(format!("negative {column} in store: {value}")))
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EventRow {
    pub event_id: String,
    pub name: String,
    pub country_name: String,
    pub country_code: String,
    pub city: String,
    pub place: String,
    pub tag: String,
    pub date_time: DateTime<Utc>,
    pub description: String,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            event_id: EventId::new(row.event_id),
            name: row.name,
            country: Country {
                name: row.country_name,
                code: CountryCode::new(row.country_code),
                city: row.city,
                place: row.place,
            },
            tag: CohortTag::new(row.tag),
            date_time: row.date_time,
            description: row.description,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub country_name: String,
    pub country_code: String,
    pub city: String,
    pub place: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            full_name: row.full_name,
            email: row.email,
            country: Country {
                name: row.country_name,
                code: CountryCode::new(row.country_code),
                city: row.city,
                place: row.place,
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TicketClassRow {
    pub ticket_id: String,
    pub event_id: String,
    pub ticket_type: String,
    pub price: i64,
    pub total_quota: i64,
    pub total_remaining: i64,
    pub country_name: String,
    pub country_code: String,
    pub city: String,
    pub place: String,
    pub tag: String,
}

impl TryFrom<TicketClassRow> for TicketClass {
    type Error = SalesError;

    fn try_from(row: TicketClassRow) -> Result<Self> {
        Ok(Self {
            ticket_id: TicketClassId::new(row.ticket_id),
            event_id: EventId::new(row.event_id),
            ticket_type: parse_ticket_type(&row.ticket_type)?,
            price: from_db("price", row.price)?,
            total_quota: from_db("total_quota", row.total_quota)?,
            total_remaining: from_db("total_remaining", row.total_remaining)?,
            country: Country {
                name: row.country_name,
                code: CountryCode::new(row.country_code),
                city: row.city,
                place: row.place,
            },
            tag: CohortTag::new(row.tag),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SlipRow {
    pub ticket_number: String,
    pub seat_number: i32,
    pub is_used: bool,
    pub user_id: Option<String>,
    pub queue_id: Option<Uuid>,
    pub ticket_id: Option<String>,
    pub event_id: String,
    pub country_code: String,
    pub price: i64,
    pub ticket_type: String,
    pub payment_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SlipRow> for TicketSlip {
    type Error = SalesError;

    fn try_from(row: SlipRow) -> Result<Self> {
        Ok(Self {
            ticket_number: row.ticket_number,
            seat_number: u32::try_from(row.seat_number).map_err(|_| {
                SalesError::Internal(format!("negative seat_number in store: {}", row.seat_number))
            })?,
            is_used: row.is_used,
            user_id: row.user_id.map(UserId::new),
            queue_id: row.queue_id.map(QueueId::from_uuid),
            ticket_id: row.ticket_id.map(TicketClassId::new),
            event_id: EventId::new(row.event_id),
            country_code: CountryCode::new(row.country_code),
            price: from_db("price", row.price)?,
            ticket_type: parse_ticket_type(&row.ticket_type)?,
            payment_status: row
                .payment_status
                .as_deref()
                .map(str::parse::<PaymentStatus>)
                .transpose()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct QueueEntryRow {
    pub queue_id: Uuid,
    pub user_id: String,
    pub event_id: String,
    pub queue_number: i64,
    pub country_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<QueueEntryRow> for QueueEntry {
    type Error = SalesError;

    fn try_from(row: QueueEntryRow) -> Result<Self> {
        Ok(Self {
            queue_id: QueueId::from_uuid(row.queue_id),
            user_id: UserId::new(row.user_id),
            event_id: EventId::new(row.event_id),
            queue_number: from_db("queue_number", row.queue_number)?,
            country_code: CountryCode::new(row.country_code),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Stored ticket types are written from `TicketType::as_str`; anything else
/// is corruption, not a bad request.
fn parse_ticket_type(raw: &str) -> Result<TicketType> {
    raw.parse()
        .map_err(|_| SalesError::Internal(format!("unknown ticket type in store: {raw}")))
}
