//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! rules file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (compile patterns, headers, processors)
//!     → RuleSet (validated, immutable)
//!     → published through RuleRegistry
//!
//! On reload:
//!     source.rs reports a newer timestamp
//!     → loader.rs loads the file again
//!     → validation.rs validates
//!     → atomic swap of Arc<RuleSet>
//! ```
//!
//! # Design Decisions
//! - Rule sets are immutable once loaded; changes require a full reload
//! - One malformed entry rejects the whole file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod source;
pub mod validation;

pub use loader::{load_rules, parse_rules, ConfigError};
pub use schema::{FilterConfig, ReloadMode, RulesFile, ServerConfig};
pub use source::{ConfigSource, FileSource};
pub use validation::ValidationError;
