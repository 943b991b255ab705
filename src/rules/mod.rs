//! Rule subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (path, query)
//!     → registry.rs (load current RuleSet snapshot)
//!     → matcher.rs (last matching URL pattern → Rule)
//!     → matcher.rs (last matching condition, else default → header list)
//!     → Return: header list or nothing
//! ```
//!
//! # Design Decisions
//! - Rules compiled at load time, immutable once published
//! - Whole rule sets are swapped on reload, never edited in place
//! - Deterministic: same input always selects the same header list

pub mod matcher;
pub mod query;
pub mod registry;
pub mod rule;

#[cfg(test)]
pub(crate) mod testing;

pub use matcher::{match_rule, resolve_headers, ResolvedHeaders, Selection};
pub use query::QueryParams;
pub use registry::{RuleRegistry, RuleSet};
pub use rule::{Condition, ConditionalHeaders, HeaderEntry, Rule};
