//! Configuration management infrastructure
//!
//! Layered figment configuration: defaults, `.experiments/config.yaml`,
//! `.experiments/local.yaml`, then `EXPERIMENTS_*` environment variables.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, CONFIG_DIR, ENV_PREFIX};
