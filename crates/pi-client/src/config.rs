//! Configuration using Figment.
//!
//! Values are layered:
//! 1. Built-in defaults
//! 2. `config.toml` (default `<config_dir>/pi-remote/config.toml`, optional)
//! 3. Environment variables prefixed `PI_REMOTE_`, nested with `__`
//!    (e.g. `PI_REMOTE_POLLER__INTERVAL_MS=250`)
//!
//! # Example
//! ```no_run
//! use pi_client::config::PiConfig;
//!
//! let config = PiConfig::load()?;
//! config.validate()?;
//! println!("Device: {}", config.device.base_url);
//! # Ok::<(), pi_client::ClientError>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment, Metadata, Source,
};
use serde::{Deserialize, Serialize};

use crate::client::HttpConfig;
use crate::commands::CommandConfig;
use crate::connection::{AddressSource, DEFAULT_DEVICE_URL};
use crate::error::{ClientError, Result};
use crate::logging::LogFormat;
use crate::reconnect::RetryPolicy;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "PI_REMOTE_";

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiConfig {
    /// Where the device lives and how long to wait for it
    pub device: DeviceConfig,
    /// Indicator polling
    pub poller: PollerConfig,
    /// Event stream
    pub stream: StreamConfig,
    /// Command queue
    pub commands: CommandsConfig,
    /// LCD behaviour
    pub lcd: LcdConfig,
    /// Diagnostics output
    pub logging: LoggingConfig,
}

/// `[device]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Base URL of the Pi's HTTP server
    pub base_url: String,
    /// Deadline for commands and polls, in milliseconds
    pub request_timeout_ms: u64,
    /// Layer that set `base_url` (filled in by the loader)
    #[serde(skip)]
    pub base_url_source: AddressSource,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DEVICE_URL.to_string(),
            request_timeout_ms: 2000,
            base_url_source: AddressSource::Default,
        }
    }
}

/// `[poller]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Poll period in milliseconds
    pub interval_ms: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self { interval_ms: 500 }
    }
}

/// `[stream]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Pause after a stream failure, in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 2000,
        }
    }
}

/// `[commands]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Commands that may wait behind the one in flight
    pub queue_capacity: usize,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self { queue_capacity: 8 }
    }
}

/// `[lcd]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LcdConfig {
    /// Blank the panel right before each update
    pub clear_before_send: bool,
}

impl Default for LcdConfig {
    fn default() -> Self {
        Self {
            clear_before_send: true,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level (trace, debug, info, warn, error); `RUST_LOG` wins if set
    pub level: String,
    /// Output format (pretty, compact, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl PiConfig {
    /// Default config file location, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pi-remote").join("config.toml"))
    }

    /// Load from the default path (if any) and the environment.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(path),
            None => Self::extract(&Self::figment()),
        }
    }

    /// Load from a specific file path. A missing file is not an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), exists = path.exists(), "Loading configuration");
        Self::extract(
            &Self::figment()
                .merge(Toml::file(path))
                .merge(env_provider()),
        )
    }

    fn extract(figment: &Figment) -> Result<Self> {
        let mut config: Self = figment.extract().map_err(config_error)?;
        config.device.base_url_source = figment
            .find_metadata("device.base_url")
            .map_or(AddressSource::Default, layer_source);
        Ok(config)
    }

    /// `device.base_url` with the layer that set it, unless it is the
    /// built-in default.
    #[must_use]
    pub fn configured_base_url(&self) -> Option<(&str, AddressSource)> {
        (self.device.base_url_source != AddressSource::Default)
            .then_some((self.device.base_url.as_str(), self.device.base_url_source))
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(env_provider())
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<()> {
        if self.device.request_timeout_ms == 0 {
            return Err(invalid("device.request_timeout_ms must be greater than 0"));
        }
        if self.poller.interval_ms == 0 {
            return Err(invalid("poller.interval_ms must be greater than 0"));
        }
        if self.stream.retry_delay_ms == 0 {
            return Err(invalid("stream.retry_delay_ms must be greater than 0"));
        }
        if self.commands.queue_capacity == 0 {
            return Err(invalid("commands.queue_capacity must be greater than 0"));
        }

        let level = self.logging.level.to_lowercase();
        if !VALID_LEVELS.contains(&level.as_str()) {
            return Err(invalid(format!(
                "Invalid logging.level '{}'. Must be one of: {}",
                self.logging.level,
                VALID_LEVELS.join(", ")
            )));
        }
        if self.logging.format.parse::<LogFormat>().is_err() {
            return Err(invalid(format!(
                "Invalid logging.format '{}'. Must be one of: pretty, compact, json",
                self.logging.format
            )));
        }

        crate::connection::DeviceAddress::parse(
            &self.device.base_url,
            crate::connection::AddressSource::ConfigFile,
        )
        .map_err(|e| invalid(format!("device.base_url: {e}")))?;

        Ok(())
    }

    /// HTTP timeouts for [`crate::DeviceClient`].
    #[must_use]
    pub fn http(&self) -> HttpConfig {
        HttpConfig::with_timeout(Duration::from_millis(self.device.request_timeout_ms))
    }

    /// Poll period.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poller.interval_ms)
    }

    /// Stream retry schedule.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(Duration::from_millis(self.stream.retry_delay_ms))
    }

    /// Command worker settings.
    #[must_use]
    pub fn command_config(&self) -> CommandConfig {
        CommandConfig {
            queue_capacity: self.commands.queue_capacity,
            clear_before_send: self.lcd.clear_before_send,
        }
    }
}

fn layer_source(metadata: &Metadata) -> AddressSource {
    match &metadata.source {
        Some(Source::File(_)) => AddressSource::ConfigFile,
        _ if metadata.name.contains("environment") => AddressSource::Environment,
        _ => AddressSource::Default,
    }
}

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

fn config_error(e: figment::Error) -> ClientError {
    ClientError::InvalidConfig(e.to_string())
}

fn invalid(message: impl Into<String>) -> ClientError {
    ClientError::InvalidConfig(message.into())
}
