//! Re-readable configuration sources.
//!
//! The reload path needs two things from a source: when it last changed and a freshly decoded
//! rule set. Timestamps are milliseconds since the Unix epoch.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::loader::{load_rules, ConfigError};
use crate::processing::ProcessorRegistry;
use crate::rules::RuleSet;

/// A configuration source the reload supervisor can poll.
pub trait ConfigSource: Send + Sync + fmt::Debug {
    /// Last modification time in milliseconds since the Unix epoch.
    fn last_modified(&self) -> Result<u64, ConfigError>;

    /// Decode a fresh rule set.
    fn load(&self) -> Result<RuleSet, ConfigError>;
}

/// A TOML rules file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    processors: ProcessorRegistry,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, processors: ProcessorRegistry) -> Self {
        Self {
            path: path.into(),
            processors,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn last_modified(&self) -> Result<u64, ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };
        let modified = self.path.metadata().and_then(|m| m.modified()).map_err(io_err)?;
        Ok(millis_since_epoch(modified))
    }

    fn load(&self) -> Result<RuleSet, ConfigError> {
        load_rules(&self.path, &self.processors)
    }
}

pub(crate) fn millis_since_epoch(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
