//! Builders for test data.
//!
//! Timestamps come from [`crate::test_clock`]; ids are derived from the
//! arguments so assertions can name them.

use crate::mocks::test_clock;
use fairqueue_core::environment::Clock;
use fairqueue_core::types::{
    CohortTag, Country, CountryCode, Event, EventId, QueueEntry, QueueId, TicketClass,
    TicketClassId, TicketSlip, TicketType, User, UserId,
};

/// Event `id` held in `country` for cohort `tag`
#[must_use]
pub fn event(id: &str, country: &str, tag: &str) -> Event {
    Event {
        event_id: EventId::new(id),
        name: format!("Event {id}"),
        country: Country {
            name: country.to_string(),
            code: CountryCode::new(country),
            city: "Capital".to_string(),
            place: "Main Stadium".to_string(),
        },
        tag: CohortTag::new(tag),
        date_time: test_clock().now() + chrono::Duration::days(30),
        description: String::new(),
    }
}

/// Buyer `id` resident in `country`
#[must_use]
pub fn user(id: &str, country: &str) -> User {
    User {
        user_id: UserId::new(id),
        full_name: format!("Buyer {id}"),
        email: format!("{id}@example.com"),
        country: Country::with_code(country),
    }
}

/// Class for `ticket_type` of `event` with `remaining` of `remaining` units
/// left (quota equals `remaining`). Its id is `<event>-<type>`.
#[must_use]
pub fn ticket_class(event: &Event, ticket_type: TicketType, price: u64, remaining: u64) -> TicketClass {
    TicketClass {
        ticket_id: class_id(event, ticket_type),
        event_id: event.event_id.clone(),
        ticket_type,
        price,
        total_quota: remaining,
        total_remaining: remaining,
        country: event.country.clone(),
        tag: event.tag.clone(),
    }
}

/// Id given to classes built by [`ticket_class`]
#[must_use]
pub fn class_id(event: &Event, ticket_type: TicketType) -> TicketClassId {
    TicketClassId::new(format!("{}-{}", event.event_id, ticket_type.as_str().to_lowercase()))
}

/// `count` unclaimed slips for (event, ticket type), seats numbered from 1
#[must_use]
pub fn slips(event: &Event, ticket_type: TicketType, count: u32) -> Vec<TicketSlip> {
    let now = test_clock().now();
    (1..=count)
        .map(|seat| {
            TicketSlip::unclaimed(
                format!("{}-{}-{seat:04}", event.event_id, ticket_type.as_str()),
                seat,
                event.event_id.clone(),
                ticket_type,
                event.country.code.clone(),
                now,
            )
        })
        .collect()
}

/// Queue entry for `user` at `position`
#[must_use]
pub fn queue_entry(event: &Event, user: &str, position: u64) -> QueueEntry {
    let now = test_clock().now();
    QueueEntry {
        queue_id: QueueId::new(),
        user_id: UserId::new(user),
        event_id: event.event_id.clone(),
        queue_number: position,
        country_code: event.country.code.clone(),
        created_at: now,
        updated_at: now,
    }
}
