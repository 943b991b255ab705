//! Rules file loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::RulesFile;
use crate::config::validation::{compile_rules, ValidationError};
use crate::processing::ProcessorRegistry;
use crate::rules::RuleSet;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate rules from TOML text.
pub fn parse_rules(content: &str, processors: &ProcessorRegistry) -> Result<RuleSet, ConfigError> {
    let file: RulesFile = toml::from_str(content)?;
    compile_rules(&file, processors).map_err(ConfigError::Validation)
}

/// Load and validate rules from a TOML file.
pub fn load_rules(path: &Path, processors: &ProcessorRegistry) -> Result<RuleSet, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rules(&content, processors)
}
