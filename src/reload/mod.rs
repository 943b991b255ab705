//! Configuration reload subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives (inline mode) or poller ticks (background mode)
//!     → supervisor.rs: time gate (interval elapsed since last check?)
//!     → supervisor.rs: change gate (source timestamp newer than last load?)
//!     → ConfigSource::load
//!     → RuleRegistry::replace (atomic swap)
//! ```
//!
//! # Design Decisions
//! - ReloadState is private to the supervisor; the matching path never sees it
//! - A failed load leaves both the registry and the known timestamp untouched

pub mod poller;
pub mod state;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testing;

pub use poller::ReloadPoller;
pub use state::ReloadState;
pub use supervisor::{CheckOutcome, ReloadSupervisor};
