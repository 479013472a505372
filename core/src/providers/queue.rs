//! Waiting-room persistence.

use crate::error::Result;
use crate::types::{EventId, PendingEntry, QueueEntry, UserId};
use std::future::Future;

/// Result of an admission attempt against the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueInsert {
    /// The entry was persisted at the returned position.
    Inserted(QueueEntry),
    /// Another entry for the same (event, user) already exists.
    AlreadyQueued,
    /// The next position would exceed the limit; nothing was written.
    Full {
        /// Position the entry would have taken
        position: u64,
    },
}

/// Queue entries for each event's waiting room.
///
/// A position is the highest persisted queue number for the event plus one.
/// It is assigned and written in one atomic step, so two concurrent
/// admissions never share a position and a refused request takes nothing.
pub trait QueueRepository: Send + Sync {
    /// Find the buyer's entry for an event.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SalesError::Store`] if the lookup fails.
    fn find_queue_entry(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<QueueEntry>>> + Send;

    /// Persist `entry` at the next position if it is within `limit`.
    ///
    /// Atomically per event: refuses a second entry for the same buyer,
    /// computes the next position, refuses it when it exceeds `limit`, and
    /// otherwise inserts the entry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SalesError::Store`] if the write fails.
    fn enqueue(
        &self,
        entry: &PendingEntry,
        limit: u64,
    ) -> impl Future<Output = Result<QueueInsert>> + Send;
}
