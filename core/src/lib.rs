//! # Fairqueue Core
//!
//! Domain types and data-access contracts for allocating scarce event tickets
//! fairly under load.
//!
//! A buyer moves through two stages:
//!
//! ```text
//! Unadmitted ──admit──▶ Admitted(queue number N) ──allocate──▶ Slip claimed (Pending)
//! ```
//!
//! This crate holds no I/O. It defines:
//!
//! - **Types**: events, buyers, ticket classes, ticket slips and queue entries
//! - **Errors**: the client/internal taxonomy shared by every component
//! - **Environment**: the [`environment::Clock`] abstraction
//! - **Providers**: one typed contract per store operation, implemented by
//!   `fairqueue-postgres` (production) and `fairqueue-testing` (in-memory)
//!
//! The admission and allocation pipelines live in `fairqueue-engine`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod environment;
pub mod error;
pub mod providers;
pub mod types;

pub use chrono::{DateTime, Utc};
pub use error::{Result, SalesError};
pub use types::*;
