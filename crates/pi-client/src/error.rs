//! Client error types.

use thiserror::Error;

use crate::connection::AddressError;

/// Result type alias using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Broad classification of a [`ClientError`].
///
/// Connectivity errors are expected while the device reboots or the network
/// drops out. Protocol errors mean the device answered with something we do
/// not understand, which usually points at a firmware/client mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Host unreachable, timeout, connection reset or stream cut short.
    Connectivity,
    /// Non-2xx status or a payload that failed to decode.
    Protocol,
    /// Problems on this side of the wire (bad address, full queue, config).
    Local,
}

impl ErrorKind {
    /// Short label for log fields.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Connectivity => "connectivity",
            Self::Protocol => "protocol",
            Self::Local => "local",
        }
    }
}

/// Errors that can occur when talking to the device.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Invalid URL format.
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Device address failed validation.
    #[error("Invalid device address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// HTTP transport error (connection refused, reset, DNS failure, ...).
    #[error("HTTP request to {endpoint} failed: {source}")]
    Request {
        /// Endpoint path that was being requested.
        endpoint: &'static str,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Connection failed with a descriptive message.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for the device.
    #[error("Request to {0} timed out")]
    Timeout(&'static str),

    /// Device answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}{}", format_body(.body))]
    Status {
        /// Endpoint path that was requested.
        endpoint: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body (may be empty).
        body: String,
    },

    /// Payload could not be decoded.
    #[error("Malformed payload: {0}")]
    Decode(String),

    /// The event stream closed without an error.
    #[error("Stream ended by device")]
    StreamEnded,

    /// Command queue is at capacity.
    #[error("Command queue is full, try again")]
    QueueFull,

    /// A background worker has shut down.
    #[error("Worker channel closed")]
    ChannelClosed,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The tracing subscriber could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    Tracing(String),
}

/// Innermost message of an error chain ("Connection refused", ...).
fn root_cause(error: &(dyn std::error::Error + 'static)) -> String {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

fn format_body(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

impl ClientError {
    /// Wrap a reqwest error, promoting timeouts to [`ClientError::Timeout`]
    /// and failed connects to [`ClientError::Connection`].
    pub(crate) fn from_reqwest(endpoint: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout(endpoint)
        } else if source.is_connect() {
            Self::Connection(format!("{endpoint}: {}", root_cause(&source)))
        } else if source.is_decode() {
            Self::Decode(format!("{endpoint}: {source}"))
        } else {
            Self::Request { endpoint, source }
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Request { .. } | Self::Connection(_) | Self::Timeout(_) | Self::StreamEnded => {
                ErrorKind::Connectivity
            }
            Self::Status { .. } | Self::Decode(_) => ErrorKind::Protocol,
            Self::UrlParse(_)
            | Self::InvalidAddress(_)
            | Self::QueueFull
            | Self::ChannelClosed
            | Self::InvalidConfig(_)
            | Self::Tracing(_) => ErrorKind::Local,
        }
    }

    /// Returns true for protocol errors (bad status or undecodable payload).
    #[must_use]
    pub fn is_protocol(&self) -> bool {
        self.kind() == ErrorKind::Protocol
    }
}

/// Convert a raw error message to a user-friendly description.
///
/// Used by the front ends for dialogs; the raw message still goes to the log.
#[must_use]
pub fn friendly_error_message(error: &str) -> String {
    let error_lower = error.to_lowercase();

    if error_lower.contains("connection refused") {
        return "Device refused the connection. Is the Pi's HTTP server running?".into();
    }

    if error_lower.contains("dns")
        || error_lower.contains("resolve")
        || error_lower.contains("no such host")
    {
        return "Cannot resolve the device hostname. Check the address.".into();
    }

    if error_lower.contains("timed out") || error_lower.contains("timeout") {
        return format!("Device did not answer in time ({error}).");
    }

    if error_lower.contains("unreachable") || error_lower.contains("network is down") {
        return "Network unreachable. Is this machine on the Pi's network?".into();
    }

    if error_lower.contains("queue is full") {
        return "Still sending the previous request, try again.".into();
    }

    error.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ClientError::Timeout("/lcd").kind(), ErrorKind::Connectivity);
        assert_eq!(ClientError::StreamEnded.kind(), ErrorKind::Connectivity);
        assert_eq!(
            ClientError::Connection("refused".into()).kind(),
            ErrorKind::Connectivity
        );
        assert_eq!(
            ClientError::Decode("bad json".into()).kind(),
            ErrorKind::Protocol
        );
        assert_eq!(ClientError::QueueFull.kind(), ErrorKind::Local);
        assert!(ClientError::Status {
            endpoint: "/lcd",
            status: 500,
            body: String::new()
        }
        .is_protocol());
    }

    #[test]
    fn test_status_display() {
        let err = ClientError::Status {
            endpoint: "/button",
            status: 503,
            body: " busy \n".into(),
        };
        assert_eq!(err.to_string(), "/button returned HTTP 503: busy");

        let err = ClientError::Status {
            endpoint: "/lcd",
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "/lcd returned HTTP 404");
    }

    #[test]
    fn test_friendly_error_message() {
        assert!(friendly_error_message("tcp connect error: Connection refused (os error 111)")
            .contains("refused"));
        assert!(friendly_error_message("Request to /lcd timed out").contains("in time"));
        assert!(friendly_error_message("Command queue is full, try again")
            .contains("previous request"));

        // Unknown errors pass through unchanged
        assert_eq!(friendly_error_message("/lcd returned HTTP 500"), "/lcd returned HTTP 500");
    }
}
