//! The device's HTTP API as a trait.
//!
//! Workers (command sender, poller, stream consumer) only see
//! [`DeviceApi`], so tests can drive them with [`crate::mock::MockDevice`]
//! instead of a real Pi.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lcd::LcdPayload;

/// `POST /lcd`
pub const LCD_ENDPOINT: &str = "/lcd";
/// `POST /button`
pub const BUTTON_ENDPOINT: &str = "/button";
/// `GET /distance`
pub const DISTANCE_ENDPOINT: &str = "/distance";
/// `GET /stream`
pub const STREAM_ENDPOINT: &str = "/stream";

/// Raw body of the event stream, chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Remote actuator state sent to `POST /button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SwitchState {
    /// `0`
    Disabled,
    /// `1`
    Enabled,
}

impl SwitchState {
    /// Wire value.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::Enabled => 1,
        }
    }

    /// Button label in the UI.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Disabled => "Disable",
            Self::Enabled => "Enable",
        }
    }
}

impl From<bool> for SwitchState {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

impl From<SwitchState> for u8 {
    fn from(state: SwitchState) -> Self {
        state.as_u8()
    }
}

impl TryFrom<u8> for SwitchState {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::Enabled),
            other => Err(format!("switch state must be 0 or 1, got {other}")),
        }
    }
}

/// Body of `POST /button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchBody {
    /// Requested state
    pub state: SwitchState,
}

/// Operations the device exposes.
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// Write both LCD lines.
    async fn send_lcd(&self, payload: &LcdPayload) -> Result<()>;

    /// Set the remote actuator.
    async fn set_switch(&self, state: SwitchState) -> Result<()>;

    /// Read the scalar state shown by the indicator (raw response body).
    async fn read_indicator(&self) -> Result<String>;

    /// Open the long-lived event stream.
    async fn open_stream(&self) -> Result<ByteStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_body_wire_format() {
        let body = SwitchBody {
            state: SwitchState::Enabled,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"state":1}"#);

        let body: SwitchBody = serde_json::from_str(r#"{"state":0}"#).unwrap();
        assert_eq!(body.state, SwitchState::Disabled);

        assert!(serde_json::from_str::<SwitchBody>(r#"{"state":2}"#).is_err());
    }

    #[test]
    fn test_switch_from_bool() {
        assert_eq!(SwitchState::from(true), SwitchState::Enabled);
        assert_eq!(SwitchState::from(false).as_u8(), 0);
    }
}
