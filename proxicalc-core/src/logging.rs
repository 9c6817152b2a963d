//! Logging initialization
//!
//! Structured logging via `tracing`, with the output format and level chosen
//! by configuration. The pipeline only emits events; formatting and sinks are
//! decided here, once, at startup.

use serde::{Deserialize, Serialize};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Whether to include file and line information
    pub include_location: bool,
    /// Optional log file; stdout when unset
    pub log_file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            log_file_path: None,
        }
    }
}

/// Initialize the logging system.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);

    let log_file = match &config.log_file_path {
        Some(log_path) => Some(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?,
        ),
        None => None,
    };

    match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_file(config.include_location)
                .with_line_number(config.include_location);

            match log_file {
                Some(file) => registry.with(fmt_layer.with_writer(file)).init(),
                None => registry.with(fmt_layer.with_writer(io::stdout)).init(),
            }
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_file(config.include_location)
                .with_line_number(config.include_location);

            match log_file {
                Some(file) => registry.with(fmt_layer.with_writer(file)).init(),
                None => registry.with(fmt_layer.with_writer(io::stdout)).init(),
            }
        }
        LogFormat::Compact => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_file(config.include_location)
                .with_line_number(config.include_location);

            match log_file {
                Some(file) => registry.with(fmt_layer.with_writer(file)).init(),
                None => registry.with(fmt_layer.with_writer(io::stdout)).init(),
            }
        }
    }

    Ok(())
}
