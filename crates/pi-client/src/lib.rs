//! HTTP client library for the Raspberry Pi LCD/sensor device.
//!
//! This crate talks to the small HTTP server on the Pi (`/lcd`, `/button`,
//! `/distance`, `/stream`) and runs the background workers the front ends
//! need: a command worker, an indicator poller and a reconnecting stream
//! consumer. It is UI-agnostic; workers report through [`EventSink`] and
//! never touch UI state.

pub mod api;
pub mod client;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod lcd;
pub mod logging;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod poller;
pub mod reconnect;
pub mod stream;

pub use api::{DeviceApi, SwitchState};
pub use client::{DeviceClient, HttpConfig};
pub use commands::{spawn_command_worker, Command, CommandConfig, CommandKind, CommandSender};
pub use config::PiConfig;
pub use connection::{
    normalize_url, resolve_address, AddressError, AddressSource, DeviceAddress,
    DEFAULT_DEVICE_PORT, DEFAULT_DEVICE_URL, DEVICE_URL_ENV,
};
pub use error::{friendly_error_message, ClientError, ErrorKind, Result};
pub use events::{ClientEvent, EventSink, DEFAULT_EVENT_CAPACITY};
pub use lcd::{LcdPayload, LCD_LINE_WIDTH};
pub use poller::{IndicatorReading, PollTrigger, StatePoller};
pub use reconnect::{RetryPolicy, StreamConsumer, StreamState};
pub use stream::SensorReading;
