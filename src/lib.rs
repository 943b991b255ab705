//! Response header manager.
//!
//! Sets HTTP response headers from declarative, pattern-based rules without touching the
//! application that produces the responses. Rules live in a TOML file that is reloaded when it
//! changes; the active rules are swapped atomically so requests always see one complete
//! generation.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod processing;
pub mod reload;
pub mod rules;

pub use config::{FilterConfig, ReloadMode};
pub use http::{with_response_headers, HeaderManager, HttpServer};
pub use lifecycle::{initialize, Shutdown, StartupError};
pub use processing::{MappingProcessor, ProcessorRegistry};
pub use rules::{Rule, RuleRegistry, RuleSet};
