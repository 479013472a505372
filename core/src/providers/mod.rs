//! Data-access contracts.
//!
//! Each store operation has its own typed result, so a wrong-shaped result is
//! a compile error rather than a runtime parse failure.
//!
//! # Implementations
//!
//! - `PostgresInventoryStore` (in `fairqueue-postgres`): production
//! - `InMemoryInventoryStore`, `InMemoryCapacityCache` (in `fairqueue-testing`): tests and demos
//! - `RedisCapacityCache` (in `fairqueue-engine`): production cache

pub mod cache;
pub mod directory;
pub mod queue;
pub mod ticket;

pub use cache::CapacityCache;
pub use directory::{EventRepository, UserRepository};
pub use queue::{QueueInsert, QueueRepository};
pub use ticket::{ChannelScope, ClaimOutcome, TicketRepository};
