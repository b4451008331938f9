//! Tracing setup for the usetofu binary
//!
//! Logs go to stderr so that stdout carries nothing but pipeline logging
//! commands.

use std::io;
pub use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Tracing output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TracingFormat {
    /// Pretty-printed human-readable format
    Pretty,
    /// Compact single-line format
    Compact,
    /// Structured JSON format
    Json,
}

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Show all logs (trace level)
    Trace,
    /// Show debug and above
    Debug,
    /// Show info and above (default)
    Info,
    /// Show warnings and above
    Warn,
    /// Show errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Output format
    pub format: TracingFormat,
    /// Level used when `RUST_LOG` is unset
    pub level: Level,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: TracingFormat::Pretty,
            level: Level::INFO,
        }
    }
}

/// Run identifier attached to the startup event
static RUN_ID: std::sync::OnceLock<Uuid> = std::sync::OnceLock::new();

/// Get or create the identifier of this run
pub fn run_id() -> Uuid {
    *RUN_ID.get_or_init(Uuid::new_v4)
}

/// Filter directives for the usetofu crates at `level`.
fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("usetofu={level},usetofu_core={level},usetofu_tools_opentofu={level}")
}

/// Initialize tracing with the given configuration
///
/// # Errors
///
/// Fails if `RUST_LOG` holds an invalid filter.
pub fn init_tracing(config: &TracingConfig) -> miette::Result<()> {
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(default_directives(config.level)),
    }
    .map_err(|e| miette::miette!("Failed to create tracing filter: {e}"))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        TracingFormat::Pretty => {
            let layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(io::stderr)
                .with_target(true);

            registry.with(layer).init();
        }
        TracingFormat::Compact => {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_target(false)
                .with_thread_ids(false);

            registry.with(layer).init();
        }
        TracingFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_span_list(true);

            registry.with(layer).init();
        }
    }

    tracing::debug!(
        run_id = %run_id(),
        version = env!("CARGO_PKG_VERSION"),
        format = ?config.format,
        "Tracing initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn test_format_parsing() {
        assert_eq!(
            TracingFormat::from_str("pretty", true).unwrap(),
            TracingFormat::Pretty
        );
        assert_eq!(
            TracingFormat::from_str("JSON", true).unwrap(),
            TracingFormat::Json
        );
        assert!(TracingFormat::from_str("dev", true).is_err());
    }

    #[test]
    fn test_level_conversion() {
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(
            default_directives(Level::WARN),
            "usetofu=warn,usetofu_core=warn,usetofu_tools_opentofu=warn"
        );
    }

    #[test]
    fn test_run_id_is_stable() {
        assert_eq!(run_id(), run_id());
    }
}
