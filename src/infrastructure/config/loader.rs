use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project directory holding `config.yaml` and `local.yaml`.
pub const CONFIG_DIR: &str = ".experiments";

/// Prefix of environment overrides, e.g. `EXPERIMENTS_LOGGING__LEVEL`.
pub const ENV_PREFIX: &str = "EXPERIMENTS_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Storage path cannot be empty")]
    EmptyStoragePath,

    #[error("Invalid request_timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Invalid experiments endpoint: {0}. Must be an http(s) URL")]
    InvalidEndpoint(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .experiments/config.yaml (project config)
    /// 3. .experiments/local.yaml (project local overrides, optional)
    /// 4. Environment variables (EXPERIMENTS_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(CONFIG_DIR)
    }

    /// Load configuration from `dir/config.yaml` and `dir/local.yaml`
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Config> {
        let dir = dir.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring environment
    /// overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.storage.path.trim().is_empty() {
            return Err(ConfigError::EmptyStoragePath);
        }

        if config.experiments.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(
                config.experiments.request_timeout_secs,
            ));
        }

        if let Some(endpoint) = &config.experiments.endpoint {
            let valid = reqwest::Url::parse(endpoint)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !valid {
                return Err(ConfigError::InvalidEndpoint(endpoint.clone()));
            }
        }

        // Validate logging config
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::ProductQuality;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.experiments.enabled);
        assert!(config.experiments.endpoint.is_none());
        assert_eq!(config.storage.path, ".experiments/state.json");
        assert_eq!(config.environment.quality, ProductQuality::Stable);
        assert_eq!(config.environment.display_language, "en");
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
experiments:
  endpoint: https://config.example.com/experiments
  request_timeout_secs: 5
environment:
  quality: insider
  display_language: pt-br
workspace:
  installed_extensions:
    - ms-python.python
  tags:
    workspace.py: true
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(
            config.experiments.endpoint.as_deref(),
            Some("https://config.example.com/experiments")
        );
        assert_eq!(config.experiments.request_timeout_secs, 5);
        assert_eq!(config.environment.quality, ProductQuality::Insider);
        assert_eq!(config.environment.display_language, "pt-br");
        assert_eq!(config.workspace.installed_extensions, vec!["ms-python.python"]);
        assert_eq!(config.workspace.tags.get("workspace.py"), Some(&true));
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.rotation, "daily");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_invalid_rotation() {
        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidRotation(_)
        ));
    }

    #[test]
    fn test_validate_empty_storage_path() {
        let mut config = Config::default();
        config.storage.path = "  ".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyStoragePath
        ));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.experiments.request_timeout_secs = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidTimeout(0)
        ));
    }

    #[test]
    fn test_validate_endpoint_scheme() {
        let mut config = Config::default();
        config.experiments.endpoint = Some("ftp://example.com/experiments".to_string());
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidEndpoint(_)
        ));

        config.experiments.endpoint = Some("not a url".to_string());
        assert!(ConfigLoader::validate(&config).is_err());

        config.experiments.endpoint = Some("http://localhost:8080/experiments".to_string());
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_hierarchical_merging() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "storage:\n  path: base.json\nworkspace:\n  tags:\n    workspace.ts: true\n",
        )
        .unwrap();
        fs::write(dir.path().join("local.yaml"), "storage:\n  path: local.json\n").unwrap();

        let config = ConfigLoader::load_from_dir(dir.path()).unwrap();

        assert_eq!(config.storage.path, "local.json", "Local override should win");
        assert_eq!(
            config.workspace.tags.get("workspace.ts"),
            Some(&true),
            "Base value should persist when not overridden"
        );
    }

    #[test]
    fn test_env_override() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "environment:\n  quality: stable\n  display_language: en\n",
        )
        .unwrap();

        temp_env::with_vars(
            [
                ("EXPERIMENTS_ENVIRONMENT__QUALITY", Some("insider")),
                ("EXPERIMENTS_ENVIRONMENT__DISPLAY_LANGUAGE", Some("de")),
            ],
            || {
                let config = ConfigLoader::load_from_dir(dir.path()).unwrap();
                assert_eq!(config.environment.quality, ProductQuality::Insider);
                assert_eq!(config.environment.display_language, "de");
            },
        );
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "experiments:\n  request_timeout_secs: 0\n").unwrap();

        assert!(ConfigLoader::load_from_file(&path).is_err());
    }
}
