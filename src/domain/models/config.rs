use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Remote experiment configuration
    #[serde(default)]
    pub experiments: ExperimentsConfig,

    /// Running product environment
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Persisted state location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Installed extensions and workspace tags
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote experiment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExperimentsConfig {
    /// Endpoint serving `{"experiments": [...]}`; no endpoint means no experiments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Master switch; when off every experiment is dropped
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ExperimentsConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            enabled: default_true(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Release channel of the running build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductQuality {
    /// Most stable channel
    Stable,
    Insider,
    Exploration,
}

impl Default for ProductQuality {
    fn default() -> Self {
        Self::Stable
    }
}

impl ProductQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Insider => "insider",
            Self::Exploration => "exploration",
        }
    }

    pub fn is_stable(&self) -> bool {
        matches!(self, Self::Stable)
    }
}

/// Product environment the experiments are evaluated against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuntimeEnvironment {
    /// Quality channel: stable, insider, exploration
    #[serde(default)]
    pub quality: ProductQuality,

    /// Active UI locale, e.g. `en` or `pt-br`
    #[serde(default = "default_display_language")]
    pub display_language: String,
}

fn default_display_language() -> String {
    "en".to_string()
}

impl Default for RuntimeEnvironment {
    fn default() -> Self {
        Self {
            quality: ProductQuality::default(),
            display_language: default_display_language(),
        }
    }
}

impl RuntimeEnvironment {
    pub fn new(quality: ProductQuality, display_language: impl Into<String>) -> Self {
        Self {
            quality,
            display_language: display_language.into(),
        }
    }
}

/// Persisted state configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfig {
    /// Path to the JSON state file
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_storage_path() -> String {
    ".experiments/state.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// Workspace facts consulted by conditions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkspaceConfig {
    /// Ids of installed extensions
    #[serde(default)]
    pub installed_extensions: Vec<String>,

    /// Workspace tag presence, e.g. `workspace.typescript: true`
    #[serde(default)]
    pub tags: HashMap<String, bool>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
