//! Read-only lookups of events and buyers.

use crate::error::Result;
use crate::types::{Event, EventId, User, UserId};
use std::future::Future;

/// Event catalogue lookup.
pub trait EventRepository: Send + Sync {
    /// Fetch an event by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SalesError::Store`] if the lookup fails. A missing
    /// event is `Ok(None)`.
    fn find_event(
        &self,
        event_id: &EventId,
    ) -> impl Future<Output = Result<Option<Event>>> + Send;
}

/// Buyer lookup.
pub trait UserRepository: Send + Sync {
    /// Fetch a buyer by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SalesError::Store`] if the lookup fails. A missing
    /// buyer is `Ok(None)`.
    fn find_user(&self, user_id: &UserId) -> impl Future<Output = Result<Option<User>>> + Send;
}
