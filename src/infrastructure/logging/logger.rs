use super::config::{LogConfig, LogFormat, RotationPolicy};
use anyhow::{Context, Result};
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// File name prefix of rolling log files.
const LOG_FILE_NAME: &str = "experiments.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logger implementation using tracing
pub struct LoggerImpl {
    _guard: Option<WorkerGuard>,
}

impl LoggerImpl {
    /// Initialize the global subscriber
    ///
    /// Console output goes to stderr so command output on stdout stays
    /// parseable. With a `log_dir`, a JSON file layer is added as well.
    ///
    /// # Returns
    /// * `Result<Self>` - Logger instance with guard to keep the file writer alive
    ///
    /// # Errors
    /// Returns an error for an invalid level or if a global subscriber is
    /// already installed
    pub fn init(config: &LogConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;
        let env_filter = || {
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy()
        };

        let mut layers: Vec<BoxedLayer> = Vec::new();

        let console_layer = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_target(true)
                .with_filter(env_filter())
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_filter(env_filter())
                .boxed(),
        };
        layers.push(console_layer);

        let guard = if let Some(ref log_dir) = config.log_dir {
            let file_appender = match config.rotation {
                RotationPolicy::Daily => rolling::daily(log_dir, LOG_FILE_NAME),
                RotationPolicy::Hourly => rolling::hourly(log_dir, LOG_FILE_NAME),
                RotationPolicy::Never => rolling::never(log_dir, LOG_FILE_NAME),
            };
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            // File layer - always JSON for structured logging
            layers.push(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking_file)
                    .with_ansi(false)
                    .with_current_span(true)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(env_filter())
                    .boxed(),
            );
            Some(guard)
        } else {
            None
        };

        tracing_subscriber::registry()
            .with(layers)
            .try_init()
            .context("Failed to install global tracing subscriber")?;

        tracing::debug!(
            level = %config.level,
            format = ?config.format,
            file_output = config.log_dir.is_some(),
            "logger initialized"
        );

        Ok(Self { _guard: guard })
    }
}

/// Parse log level string to Level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}
