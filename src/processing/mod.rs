//! Header application subsystem.
//!
//! # Data Flow
//! ```text
//! Resolved header list + Rule
//!     → applicator.rs (pre_process → apply_headers → post_process)
//!     → processor.rs (strategy selected per rule at load time)
//!     → Response headers mutated; body and status untouched
//! ```

pub mod applicator;
pub mod processor;

pub use applicator::{apply, ApplyError, Phase};
pub use processor::{
    AppendHeaders, MappingProcessor, ProcessorError, ProcessorRegistry, RequestContext,
    SetHeaders, APPEND_PROCESSOR, DEFAULT_PROCESSOR,
};
