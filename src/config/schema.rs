//! Configuration schema definitions.
//!
//! Two kinds of configuration live here: the rules file that declares URL mappings, and the
//! initialization parameters injected at startup. All types derive Serde traits.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root of a rules file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RulesFile {
    /// URL mappings in declaration order. Later mappings take precedence.
    #[serde(rename = "mapping")]
    pub mappings: Vec<MappingConfig>,
}

/// One `[[mapping]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappingConfig {
    /// Regular expression searched within the request path.
    pub url: String,

    /// Processor name (default: `"default"`).
    #[serde(default)]
    pub processor: Option<String>,

    /// Headers applied when no conditional entry fires.
    #[serde(default)]
    pub default: Option<Vec<HeaderConfig>>,

    /// Conditional header lists, in declaration order.
    #[serde(default)]
    pub conditional: Vec<ConditionalConfig>,
}

/// One `[[mapping.conditional]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConditionalConfig {
    /// Query parameter name.
    pub param: String,

    /// Regular expression searched within the parameter value.
    pub value: String,

    /// Headers applied when the condition fires.
    #[serde(rename = "header", default)]
    pub headers: Vec<HeaderConfig>,
}

/// A single header assignment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeaderConfig {
    pub name: String,
    pub value: String,
}

/// How configuration staleness checks are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReloadMode {
    /// Checked by whichever request arrives after the interval elapsed.
    #[default]
    Inline,
    /// Checked by a dedicated background task.
    Background,
}

/// Initialization parameters of the header manager.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Path to the rules file.
    pub config_file: PathBuf,

    /// Seconds between staleness checks. Zero or negative disables reloading.
    pub reload_check_interval_secs: i64,

    pub reload_mode: ReloadMode,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("response-headers.toml"),
            reload_check_interval_secs: 10,
            reload_mode: ReloadMode::Inline,
        }
    }
}

impl FilterConfig {
    pub fn reload_enabled(&self) -> bool {
        self.reload_check_interval_secs > 0
    }
}

/// Settings for the bundled HTTP server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Directory served as static content. A plain `200 OK` responder is used when unset.
    pub static_root: Option<PathBuf>,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            static_root: None,
            request_timeout_secs: 30,
        }
    }
}
