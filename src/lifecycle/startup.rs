//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate the rules file
//! - Build the registry, reload supervisor and middleware state
//!
//! # Design Decisions
//! - Fail fast: a missing or invalid rules file at startup is fatal
//! - Reload timers start from the moment the first load completed

use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, ConfigSource, FileSource, FilterConfig};
use crate::http::HeaderManager;
use crate::observability::metrics;
use crate::processing::ProcessorRegistry;
use crate::reload::supervisor::now_millis;
use crate::reload::{ReloadState, ReloadSupervisor};
use crate::rules::RuleRegistry;

/// The header manager could not be initialized.
#[derive(Debug, Error)]
#[error("cannot initialize response header manager: {0}")]
pub struct StartupError(#[from] pub ConfigError);

/// Initialize from the rules file named in `config`.
pub fn initialize(
    config: &FilterConfig,
    processors: ProcessorRegistry,
) -> Result<Arc<HeaderManager>, StartupError> {
    tracing::info!(path = %config.config_file.display(), "Loading header rules");
    let source = Arc::new(FileSource::new(&config.config_file, processors));
    initialize_with_source(config, source)
}

/// Initialize from an arbitrary configuration source.
pub fn initialize_with_source(
    config: &FilterConfig,
    source: Arc<dyn ConfigSource>,
) -> Result<Arc<HeaderManager>, StartupError> {
    let modified = source.last_modified()?;
    let rules = source.load()?;
    let count = rules.len();

    let registry = Arc::new(RuleRegistry::new(rules));
    let state = ReloadState::new(config.reload_check_interval_secs, now_millis(), modified);
    let supervisor = Arc::new(ReloadSupervisor::new(source, registry, state));

    metrics::record_rules_loaded(count);
    tracing::info!(
        rules = count,
        reload_enabled = supervisor.reload_enabled(),
        reload_interval_secs = config.reload_check_interval_secs,
        reload_mode = ?config.reload_mode,
        "Header rules loaded"
    );

    Ok(Arc::new(HeaderManager::new(supervisor, config.reload_mode)))
}
