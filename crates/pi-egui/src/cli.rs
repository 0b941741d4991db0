//! Command-line arguments and start-up shared by both binaries.

use std::path::PathBuf;

use clap::Parser;
use pi_client::{
    config::PiConfig,
    logging::{self, TracingConfig},
    resolve_address, DeviceAddress,
};

/// Arguments accepted by `pi-lcd` and `pi-sensor`.
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about = "Desktop client for the Raspberry Pi LCD/sensor device")]
pub struct CliArgs {
    /// Configuration file (TOML); defaults to the per-user config dir
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Device base URL, e.g. http://172.20.10.3:8000
    #[arg(long, value_name = "URL")]
    pub device_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

/// Everything an app needs before opening its window.
#[derive(Debug, Clone)]
pub struct Startup {
    /// Validated configuration
    pub config: PiConfig,
    /// Resolved device address
    pub address: DeviceAddress,
}

impl CliArgs {
    /// Fold the flags into a loaded configuration.
    pub fn apply(&self, config: &mut PiConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
    }

    /// Tracing settings for `config`. A `--log-level` flag is not overridden
    /// by `RUST_LOG`.
    pub fn tracing_config(&self, config: &PiConfig) -> pi_client::Result<TracingConfig> {
        Ok(TracingConfig::from_config(config)?.with_env_override(self.log_level.is_none()))
    }
}

/// Load and validate configuration, install tracing, and resolve the device
/// address (CLI flag, then `PI_REMOTE_DEVICE_URL`, then config, then default).
pub fn startup(args: &CliArgs) -> anyhow::Result<Startup> {
    let mut config = match &args.config {
        Some(path) => PiConfig::load_from(path)?,
        None => PiConfig::load()?,
    };
    args.apply(&mut config);
    config.validate()?;
    logging::init(args.tracing_config(&config)?)?;

    let address = resolve_address(args.device_url.as_deref(), config.configured_base_url());
    tracing::info!(
        address = address.as_str(),
        source = address.source().label(),
        "Resolved device address"
    );

    Ok(Startup { config, address })
}

/// Runtime that hosts the background workers.
pub fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("pi-worker")
        .enable_all()
        .build()
}
