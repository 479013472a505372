//! `PostgreSQL` inventory store for fairqueue.
//!
//! Implements the inventory contracts from `fairqueue-core` (events, buyers,
//! the waiting queue, ticket classes and slips) on `PostgreSQL` via sqlx:
//!
//! - Queue admission in one transaction under a per-event advisory lock:
//!   the position is the highest persisted number plus one, checked against
//!   the capacity before anything is written
//! - Slip claims in one transaction: ownership check, guarded class
//!   decrement and a `FOR UPDATE SKIP LOCKED` slip pick
//! - A partial unique index keeping one claimed slip per (event, buyer)
//!
//! Schema lives in `migrations/` and is applied with
//! [`PostgresInventoryStore::migrate`].
//!
//! # Example
//!
//! ```no_run
//! use fairqueue_postgres::PostgresInventoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresInventoryStore::connect("postgres://localhost/fairqueue", 10).await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod rows;
mod store;

pub use store::PostgresInventoryStore;
