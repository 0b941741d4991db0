//! Tracing setup for the front ends.
//!
//! One subscriber per process: an `EnvFilter` in front of a pretty, compact
//! or JSON fmt layer. `RUST_LOG` wins over a configured level, but not over
//! one given on the command line.
//!
//! # Example
//! ```no_run
//! use pi_client::{config::PiConfig, logging::{self, TracingConfig}};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PiConfig::load()?;
//! logging::init(TracingConfig::from_config(&config)?)?;
//! tracing::info!(component = "lcd", "Started");
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::PiConfig;
use crate::error::{ClientError, Result};

/// Output format for tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line with colors (development)
    #[default]
    Pretty,
    /// Single line without colors
    Compact,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ClientError::InvalidConfig(format!(
                "Invalid log format '{other}'. Must be one of: pretty, compact, json"
            ))),
        }
    }
}

/// Tracing configuration options
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default level when `RUST_LOG` is not set
    pub level: Level,
    /// Output format
    pub format: LogFormat,
    /// Whether to include file and line numbers
    pub with_file_and_line: bool,
    /// Whether to include thread names
    pub with_thread_names: bool,
    /// Whether to enable ANSI colors (Pretty only)
    pub with_ansi: bool,
    /// Whether `RUST_LOG` may replace `level`
    pub env_override: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            with_file_and_line: false,
            with_thread_names: true,
            with_ansi: true,
            env_override: true,
        }
    }
}

impl TracingConfig {
    /// Build from the `[logging]` section.
    pub fn from_config(config: &PiConfig) -> Result<Self> {
        Ok(Self {
            level: parse_log_level(&config.logging.level)?,
            format: config.logging.format.parse()?,
            ..Default::default()
        })
    }

    /// Create tracing config with custom settings
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Set output format
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Allow or forbid `RUST_LOG` to replace the level
    #[must_use]
    pub fn with_env_override(mut self, enabled: bool) -> Self {
        self.env_override = enabled;
        self
    }
}

/// Filter directive for `config`, given the value of `RUST_LOG`.
fn filter_directive(config: &TracingConfig, rust_log: Option<String>) -> String {
    match rust_log.filter(|_| config.env_override) {
        Some(directive) if !directive.trim().is_empty() => directive,
        _ => config.level.as_str().to_lowercase(),
    }
}

/// Install the global subscriber.
///
/// Idempotent: if a subscriber is already set (tests, a second front end in
/// the same process) this returns `Ok(())`.
pub fn init(config: TracingConfig) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        tracing::debug!("Tracing already initialized");
        return Ok(());
    }

    let directive = filter_directive(&config, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    // An unparsable RUST_LOG falls back to the configured level
    let env_filter = EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str().to_lowercase()));

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .with_thread_names(config.with_thread_names)
            .with_ansi(config.with_ansi)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .with_thread_names(config.with_thread_names)
            .with_ansi(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .with_thread_names(config.with_thread_names)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .try_init()
        .or_else(|e| {
            let message = e.to_string();
            if message.contains("a global default trace dispatcher has already been set")
                || message.contains("logging system was already initialized")
            {
                Ok(())
            } else {
                Err(ClientError::Tracing(message))
            }
        })
}

/// Parse log level string into tracing Level
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(ClientError::InvalidConfig(format!(
            "Invalid log level '{level}'. Must be one of: trace, debug, info, warn, error"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert!(matches!(parse_log_level("trace"), Ok(Level::TRACE)));
        assert!(matches!(parse_log_level("warn"), Ok(Level::WARN)));

        // Case insensitive
        assert!(matches!(parse_log_level("INFO"), Ok(Level::INFO)));
        assert!(matches!(parse_log_level("Debug"), Ok(Level::DEBUG)));

        assert!(parse_log_level("invalid").is_err());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_tracing_config_from_file_section() {
        let mut config = PiConfig::default();
        config.logging.level = "debug".into();
        config.logging.format = "json".into();

        let tracing_config = TracingConfig::from_config(&config).unwrap();
        assert_eq!(tracing_config.level, Level::DEBUG);
        assert_eq!(tracing_config.format, LogFormat::Json);
        assert!(tracing_config.env_override);
    }

    #[test]
    fn test_rust_log_only_overrides_when_allowed() {
        let config = TracingConfig::new(Level::DEBUG);
        assert_eq!(filter_directive(&config, None), "debug");
        assert_eq!(
            filter_directive(&config, Some("pi_client=trace".into())),
            "pi_client=trace"
        );
        assert_eq!(filter_directive(&config, Some("  ".into())), "debug");

        let pinned = config.with_env_override(false);
        assert_eq!(filter_directive(&pinned, Some("error".into())), "debug");
    }
}
