//! Device address configuration and URL normalization.
//!
//! - [`DeviceAddress`]: Validated base URL of the Pi's HTTP server, with source tracking
//! - [`AddressSource`]: Where the address configuration came from
//! - [`AddressError`]: User-friendly validation errors
//!
//! # Address Resolution Precedence
//!
//! Addresses are resolved in this order (highest priority first):
//! 1. `--device-url` on the command line
//! 2. `PI_REMOTE_DEVICE_URL` environment variable
//! 3. `device.base_url` from the configuration file
//! 4. Default: `http://172.20.10.3:8000`
//!
//! # URL Normalization
//!
//! The [`normalize_url`] function handles common input formats:
//! - Bare host:port (e.g., `192.168.1.40:8000` → `http://192.168.1.40:8000/`)
//! - Missing port (e.g., `http://raspberrypi.local` → `http://raspberrypi.local:8000/`)
//!
//! # Example
//!
//! ```
//! use pi_client::connection::{AddressSource, DeviceAddress};
//!
//! let addr = DeviceAddress::parse("192.168.1.40", AddressSource::CommandLine)?;
//! assert_eq!(addr.as_str(), "http://192.168.1.40:8000/");
//! # Ok::<(), pi_client::connection::AddressError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Port the device's HTTP server listens on.
pub const DEFAULT_DEVICE_PORT: u16 = 8000;

/// Address of the Pi on the hotspot network the clients were built for.
pub const DEFAULT_DEVICE_URL: &str = "http://172.20.10.3:8000";

/// Environment variable overriding the configured device URL.
pub const DEVICE_URL_ENV: &str = "PI_REMOTE_DEVICE_URL";

/// Source of the device address configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AddressSource {
    /// Hardcoded default
    #[default]
    Default,
    /// `device.base_url` in the configuration file
    ConfigFile,
    /// Loaded from `PI_REMOTE_DEVICE_URL` or `PI_REMOTE_DEVICE__BASE_URL`
    Environment,
    /// Passed with `--device-url`
    CommandLine,
}

impl AddressSource {
    /// Returns a short label for display in the UI.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ConfigFile => "config",
            Self::Environment => "env",
            Self::CommandLine => "cli",
        }
    }
}

impl fmt::Display for AddressSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "Default"),
            Self::ConfigFile => write!(f, "Configuration file"),
            Self::Environment => write!(f, "Environment ({DEVICE_URL_ENV})"),
            Self::CommandLine => write!(f, "Command line (--device-url)"),
        }
    }
}

/// Validated device address with metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAddress {
    /// The normalized URL (always has scheme, port and trailing slash)
    url: String,
    /// Where this address came from
    source: AddressSource,
}

impl DeviceAddress {
    /// Parse and normalize a device URL.
    pub fn parse(input: &str, source: AddressSource) -> Result<Self, AddressError> {
        let normalized = normalize_url(input)?;
        Ok(Self {
            url: normalized.to_string(),
            source,
        })
    }

    /// Returns the normalized URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Returns where this address came from.
    #[must_use]
    pub fn source(&self) -> AddressSource {
        self.source
    }

    /// Build the URL of an endpoint relative to this address.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&self.url)?.join(path.trim_start_matches('/'))
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// URL validation error with user-friendly messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Input was empty or whitespace-only
    EmptyInput,
    /// URL parsing failed
    InvalidUrl(String),
    /// No host was found in the URL
    MissingHost,
    /// Port could not be set
    InvalidPort(String),
    /// Unsupported URL scheme (only http/https allowed)
    UnsupportedScheme(String),
}

impl std::error::Error for AddressError {}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "Address cannot be empty"),
            Self::InvalidUrl(e) => write!(f, "Invalid URL: {e}"),
            Self::MissingHost => write!(f, "URL must include a host"),
            Self::InvalidPort(e) => write!(f, "Invalid port: {e}"),
            Self::UnsupportedScheme(s) => write!(f, "Unsupported scheme '{s}' (use http or https)"),
        }
    }
}

/// Normalize a device URL string.
///
/// - Adds `http://` scheme if missing
/// - Adds the device port (8000) if missing
/// - Trims whitespace
///
/// ```
/// use pi_client::connection::normalize_url;
///
/// let url = normalize_url("raspberrypi.local")?;
/// assert_eq!(url.as_str(), "http://raspberrypi.local:8000/");
/// # Ok::<(), pi_client::connection::AddressError>(())
/// ```
pub fn normalize_url(input: &str) -> Result<Url, AddressError> {
    let input = input.trim();

    if input.is_empty() {
        return Err(AddressError::EmptyInput);
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("http://{input}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| AddressError::InvalidUrl(e.to_string()))?;

    let scheme = url.scheme().to_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(AddressError::UnsupportedScheme(scheme));
    }

    if url.host().is_none() {
        return Err(AddressError::MissingHost);
    }

    // Url::port() returns None for the scheme's default port too, so only
    // fill in when the input really had no port.
    if url.port().is_none() && !has_explicit_port(&with_scheme) {
        url.set_port(Some(DEFAULT_DEVICE_PORT))
            .map_err(|()| AddressError::InvalidPort("Cannot set port on this URL".to_string()))?;
    }

    Ok(url)
}

fn has_explicit_port(with_scheme: &str) -> bool {
    let after_scheme = with_scheme.split_once("://").map_or(with_scheme, |(_, rest)| rest);
    let authority = after_scheme.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    match host_port.rfind(']') {
        // IPv6 literal: port can only follow the closing bracket
        Some(end) => host_port[end..].contains(':'),
        None => host_port.contains(':'),
    }
}

/// Resolve the device address from multiple sources with precedence.
///
/// Invalid entries are skipped with a warning; the result falls back to
/// [`DEFAULT_DEVICE_URL`] and never fails.
///
/// `configured` is the loaded `device.base_url` together with the layer that
/// set it; pass `None` when it is only the built-in default.
pub fn resolve_address(
    cli: Option<&str>,
    configured: Option<(&str, AddressSource)>,
) -> DeviceAddress {
    let env = std::env::var(DEVICE_URL_ENV).ok();
    resolve_from(cli, env.as_deref(), configured)
}

fn resolve_from(
    cli: Option<&str>,
    env: Option<&str>,
    configured: Option<(&str, AddressSource)>,
) -> DeviceAddress {
    let (configured, configured_source) = match configured {
        Some((input, source)) => (Some(input), source),
        None => (None, AddressSource::ConfigFile),
    };
    let candidates = [
        (cli, AddressSource::CommandLine),
        (env, AddressSource::Environment),
        (configured, configured_source),
    ];

    for (input, source) in candidates {
        let Some(input) = input.filter(|s| !s.trim().is_empty()) else {
            continue;
        };
        match DeviceAddress::parse(input, source) {
            Ok(addr) => return addr,
            Err(e) => {
                tracing::warn!(source = source.label(), input, error = %e, "Ignoring invalid device address");
            }
        }
    }

    default_address()
}

fn default_address() -> DeviceAddress {
    DeviceAddress {
        url: format!("{DEFAULT_DEVICE_URL}/"),
        source: AddressSource::Default,
    }
}

impl Default for DeviceAddress {
    fn default() -> Self {
        default_address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bare_host_port() {
        let url = normalize_url("127.0.0.1:8000").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/");
    }

    #[test]
    fn test_normalize_adds_default_port() {
        let url = normalize_url("http://raspberrypi.local").unwrap();
        assert_eq!(url.as_str(), "http://raspberrypi.local:8000/");
    }

    #[test]
    fn test_normalize_keeps_explicit_scheme_port() {
        // :80 is http's default, so Url drops it from the string; it must not
        // be replaced by 8000.
        let url = normalize_url("http://pi.lan:80").unwrap();
        assert_eq!(url.as_str(), "http://pi.lan/");
    }

    #[test]
    fn test_normalize_ipv6() {
        let url = normalize_url("[::1]:9000").unwrap();
        assert_eq!(url.as_str(), "http://[::1]:9000/");

        let url = normalize_url("http://[::1]").unwrap();
        assert_eq!(url.as_str(), "http://[::1]:8000/");
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        let url = normalize_url("  10.0.0.2:8000  ").unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.2:8000/");
    }

    #[test]
    fn test_normalize_rejects_bad_input() {
        assert_eq!(normalize_url("   ").unwrap_err(), AddressError::EmptyInput);
        assert!(matches!(
            normalize_url("ftp://pi.lan").unwrap_err(),
            AddressError::UnsupportedScheme(_)
        ));
    }

    #[test]
    fn test_default_address_matches_constant() {
        let addr = DeviceAddress::default();
        let parsed = DeviceAddress::parse(DEFAULT_DEVICE_URL, AddressSource::Default).unwrap();
        assert_eq!(addr, parsed);
        assert_eq!(addr.as_str(), "http://172.20.10.3:8000/");
    }

    #[test]
    fn test_endpoint_join() {
        let addr = DeviceAddress::parse("pi.lan:8000", AddressSource::CommandLine).unwrap();
        assert_eq!(addr.endpoint("/lcd").unwrap().as_str(), "http://pi.lan:8000/lcd");
        assert_eq!(
            addr.endpoint("stream").unwrap().as_str(),
            "http://pi.lan:8000/stream"
        );
    }

    #[test]
    fn test_resolve_precedence() {
        let cfg = Some(("cfg.lan", AddressSource::ConfigFile));
        let addr = resolve_from(Some("cli.lan"), Some("env.lan"), cfg);
        assert_eq!(addr.source(), AddressSource::CommandLine);

        let addr = resolve_from(None, Some("env.lan"), cfg);
        assert_eq!(addr.as_str(), "http://env.lan:8000/");
        assert_eq!(addr.source(), AddressSource::Environment);

        let addr = resolve_from(Some("  "), None, Some(("cfg.lan:8080", AddressSource::ConfigFile)));
        assert_eq!(addr.as_str(), "http://cfg.lan:8080/");
        assert_eq!(addr.source(), AddressSource::ConfigFile);
    }

    #[test]
    fn test_resolve_keeps_configured_source() {
        let addr = resolve_from(None, None, Some(("env-cfg.lan", AddressSource::Environment)));
        assert_eq!(addr.source(), AddressSource::Environment);

        let addr = resolve_from(None, None, Some((DEFAULT_DEVICE_URL, AddressSource::ConfigFile)));
        assert_eq!(addr.source(), AddressSource::ConfigFile);
        assert_eq!(addr.as_str(), DeviceAddress::default().as_str());
    }

    #[test]
    fn test_resolve_skips_invalid_and_falls_back() {
        let addr = resolve_from(Some("ftp://nope"), None, None);
        assert_eq!(addr.source(), AddressSource::Default);
    }
}
