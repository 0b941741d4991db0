//! Event stream consumer with retry-forever reconnect.
//!
//! # State Machine
//!
//! ```text
//!   Idle ──start()──> Connecting ──open ok──> Streaming
//!    ▲                  ▲    │                    │
//!    │                  │  open failed      error / body ended
//!    │                  │    ▼                    │
//!    └──shutdown()───── Backoff <─────────────────┘
//! ```
//!
//! Every failure, whether transport or protocol, ends the current stream as
//! a whole. The consumer waits a fixed delay and reopens, indefinitely. Only
//! cancelling the lifecycle token stops it.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::DeviceApi;
use crate::error::ClientError;
use crate::events::{ClientEvent, EventSink};
use crate::stream::LineDecoder;

/// Default pause between a stream failure and the next attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Lifecycle of the stream consumer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Not started, or shut down.
    #[default]
    Idle,

    /// Opening `GET /stream`.
    Connecting {
        /// Consecutive attempt number since the last open stream (1-based)
        attempt: u32,
    },

    /// Stream is open and samples are flowing.
    Streaming,

    /// Waiting before the next attempt.
    Backoff {
        /// Attempt that just failed
        attempt: u32,
        /// Pause before the next attempt
        delay: Duration,
        /// Display string of the failure
        last_error: String,
        /// The device sent something undecodable (as opposed to a dropped
        /// or refused connection)
        protocol: bool,
    },
}

impl StreamState {
    /// Short status label for UI display.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Stream idle",
            Self::Connecting { .. } => "Connecting...",
            Self::Streaming => "Streaming",
            Self::Backoff { protocol: true, .. } => "Protocol error, retrying...",
            Self::Backoff { .. } => "Reconnecting...",
        }
    }

    /// Returns the last failure while backing off.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Backoff { last_error, .. } => Some(last_error),
            _ => None,
        }
    }
}

/// Retry schedule for the stream.
///
/// The delay is fixed: the device is either rebooting or off the network,
/// and both resolve on a human time scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause after each failure.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy with a fixed `delay`.
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }
}

/// Owns the background stream task.
pub struct StreamConsumer {
    device: Arc<dyn DeviceApi>,
    sink: EventSink,
    policy: RetryPolicy,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl StreamConsumer {
    /// Create a stopped consumer.
    #[must_use]
    pub fn new(device: Arc<dyn DeviceApi>, sink: EventSink, policy: RetryPolicy) -> Self {
        Self {
            device,
            sink,
            policy,
            token: CancellationToken::new(),
            task: None,
        }
    }

    /// Start consuming on `handle`.
    ///
    /// Returns `false` without spawning anything if the consumer was already
    /// started (or shut down).
    pub fn start(&mut self, handle: &Handle) -> bool {
        if self.task.is_some() {
            tracing::debug!("Stream consumer already started");
            return false;
        }
        if self.token.is_cancelled() {
            tracing::warn!("Stream consumer was shut down, not restarting");
            return false;
        }

        tracing::info!(retry_delay_ms = self.policy.delay.as_millis() as u64, "Starting stream consumer");
        self.task = Some(handle.spawn(run_stream_loop(
            self.device.clone(),
            self.sink.clone(),
            self.policy.clone(),
            self.token.clone(),
        )));
        true
    }

    /// Returns true while the background task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Lifecycle token of the background task.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Ask the background task to stop. Works in any state, including
    /// mid-backoff.
    pub fn shutdown(&self) {
        if !self.token.is_cancelled() {
            tracing::info!("Stopping stream consumer");
            self.token.cancel();
        }
    }

    /// Wait for the background task to finish after [`StreamConsumer::shutdown`].
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Stream task ended abnormally");
            }
        }
    }
}

/// Why a single stream session ended.
enum StreamEnd {
    Failed(ClientError),
    SinkClosed,
}

impl From<ClientError> for StreamEnd {
    fn from(e: ClientError) -> Self {
        Self::Failed(e)
    }
}

enum Stop {
    Cancelled,
    SinkClosed,
}

/// Connect, consume, back off, repeat until `token` is cancelled.
pub async fn run_stream_loop(
    device: Arc<dyn DeviceApi>,
    sink: EventSink,
    policy: RetryPolicy,
    token: CancellationToken,
) {
    let mut attempt: u32 = 0;

    let stop = loop {
        attempt = attempt.saturating_add(1);
        if !sink.emit(ClientEvent::Stream(StreamState::Connecting { attempt })).await {
            break Stop::SinkClosed;
        }

        let mut opened = false;
        let outcome = tokio::select! {
            _ = token.cancelled() => break Stop::Cancelled,
            outcome = pump(device.as_ref(), &sink, &mut opened) => outcome,
        };
        let failed_attempt = attempt;
        if opened {
            attempt = 0;
        }
        let error = match outcome {
            Ok(()) => ClientError::StreamEnded,
            Err(StreamEnd::Failed(e)) => e,
            Err(StreamEnd::SinkClosed) => break Stop::SinkClosed,
        };

        let protocol = error.is_protocol();
        let line = if protocol {
            tracing::error!(attempt = failed_attempt, error = %error, "Stream protocol error, reconnecting");
            format!("[stream protocol error] {error}")
        } else {
            tracing::warn!(attempt = failed_attempt, error = %error, "Stream failed, reconnecting");
            format!("[stream error] {error}")
        };
        if !sink.log(line).await {
            break Stop::SinkClosed;
        }

        let backoff = StreamState::Backoff {
            attempt: failed_attempt,
            delay: policy.delay,
            last_error: error.to_string(),
            protocol,
        };
        if !sink.emit(ClientEvent::Stream(backoff)).await {
            break Stop::SinkClosed;
        }

        tokio::select! {
            _ = token.cancelled() => break Stop::Cancelled,
            _ = tokio::time::sleep(policy.delay) => {}
        }
    };

    if let Stop::Cancelled = stop {
        sink.emit(ClientEvent::Stream(StreamState::Idle)).await;
    }
    tracing::info!("Stream consumer stopped");
}

/// One stream session. Returns `Ok` when the body ends cleanly.
async fn pump(
    device: &dyn DeviceApi,
    sink: &EventSink,
    opened: &mut bool,
) -> std::result::Result<(), StreamEnd> {
    let mut body = device.open_stream().await?;

    tracing::info!("Event stream open");
    *opened = true;
    if !sink.emit(ClientEvent::Stream(StreamState::Streaming)).await {
        return Err(StreamEnd::SinkClosed);
    }

    let mut decoder = LineDecoder::new();
    while let Some(chunk) = body.next().await {
        decoder.feed(&chunk?);
        while let Some(reading) = decoder.next_reading() {
            let reading = reading?;
            tracing::trace!(cm = reading.cm, "Sensor sample");
            if !sink.log(reading.log_line()).await {
                return Err(StreamEnd::SinkClosed);
            }
        }
    }

    if decoder.pending() > 0 {
        tracing::debug!(bytes = decoder.pending(), "Discarding partial line at end of stream");
    }
    Ok(())
}
