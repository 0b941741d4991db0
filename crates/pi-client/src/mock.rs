//! Scriptable in-memory device for tests and offline UI work.
//!
//! Enabled with the `mock` feature (always on in this crate's unit tests).

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tokio::time::Instant;

use crate::api::{ByteStream, DeviceApi, SwitchState};
use crate::error::{ClientError, Result};
use crate::lcd::LcdPayload;

/// What the next `open_stream` call does.
#[derive(Debug, Clone)]
pub enum MockStream {
    /// Fail to connect with this message
    Refuse(String),
    /// Deliver the chunks, then end the body
    Chunks(Vec<Bytes>),
    /// Deliver the chunks, then fail mid-body with this message
    ChunksThenError(Vec<Bytes>, String),
    /// Deliver the chunks, then stay open forever
    ChunksThenHang(Vec<Bytes>),
}

impl MockStream {
    /// Convenience: frames built from `data:` lines.
    #[must_use]
    pub fn lines_then_hang(lines: &[&str]) -> Self {
        Self::ChunksThenHang(
            lines
                .iter()
                .map(|line| Bytes::from(format!("{line}\n")))
                .collect(),
        )
    }
}

#[derive(Default)]
struct MockState {
    indicator_script: VecDeque<std::result::Result<String, String>>,
    indicator: String,
    indicator_reads: usize,
    lcd_posts: Vec<LcdPayload>,
    switch_posts: Vec<SwitchState>,
    command_failure: Option<String>,
    command_delay: Option<Duration>,
    stream_script: VecDeque<MockStream>,
    stream_opens: Vec<Instant>,
}

/// In-memory [`DeviceApi`].
pub struct MockDevice {
    state: Mutex<MockState>,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    /// Device that reads `"0"`, accepts every command, and serves a silent
    /// stream.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                indicator: "0".into(),
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the result of one indicator read. `Err` becomes a connection error.
    pub fn push_indicator(&self, result: std::result::Result<&str, &str>) {
        self.lock()
            .indicator_script
            .push_back(result.map(str::to_string).map_err(str::to_string));
    }

    /// Value returned once the script is exhausted.
    pub fn set_indicator(&self, value: &str) {
        self.lock().indicator = value.to_string();
    }

    /// Number of indicator reads so far.
    #[must_use]
    pub fn indicator_reads(&self) -> usize {
        self.lock().indicator_reads
    }

    /// Every LCD payload sent, including failed attempts.
    #[must_use]
    pub fn lcd_posts(&self) -> Vec<LcdPayload> {
        self.lock().lcd_posts.clone()
    }

    /// Number of LCD requests made.
    #[must_use]
    pub fn lcd_attempts(&self) -> usize {
        self.lock().lcd_posts.len()
    }

    /// Every switch state sent, including failed attempts.
    #[must_use]
    pub fn switch_posts(&self) -> Vec<SwitchState> {
        self.lock().switch_posts.clone()
    }

    /// Make LCD and switch commands fail with `message` (or succeed with `None`).
    pub fn fail_commands(&self, message: Option<&str>) {
        self.lock().command_failure = message.map(str::to_string);
    }

    /// Hold every command for `delay` before answering.
    pub fn set_command_delay(&self, delay: Duration) {
        self.lock().command_delay = Some(delay);
    }

    /// Queue the behaviour of one `open_stream` call.
    pub fn push_stream(&self, script: MockStream) {
        self.lock().stream_script.push_back(script);
    }

    /// When each `open_stream` call happened.
    #[must_use]
    pub fn stream_opens(&self) -> Vec<Instant> {
        self.lock().stream_opens.clone()
    }

    async fn command_outcome(&self) -> Result<()> {
        let (delay, failure) = {
            let state = self.lock();
            (state.command_delay, state.command_failure.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(message) => Err(ClientError::Connection(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DeviceApi for MockDevice {
    async fn send_lcd(&self, payload: &LcdPayload) -> Result<()> {
        self.lock().lcd_posts.push(payload.clone());
        self.command_outcome().await
    }

    async fn set_switch(&self, state: SwitchState) -> Result<()> {
        self.lock().switch_posts.push(state);
        self.command_outcome().await?;
        self.lock().indicator = state.as_u8().to_string();
        Ok(())
    }

    async fn read_indicator(&self) -> Result<String> {
        let mut state = self.lock();
        state.indicator_reads += 1;
        match state.indicator_script.pop_front() {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(ClientError::Connection(message)),
            None => Ok(state.indicator.clone()),
        }
    }

    async fn open_stream(&self) -> Result<ByteStream> {
        let script = {
            let mut state = self.lock();
            state.stream_opens.push(Instant::now());
            state.stream_script.pop_front()
        };

        let chunks =
            |list: Vec<Bytes>| stream::iter(list.into_iter().map(Ok::<Bytes, ClientError>));
        Ok(match script {
            Some(MockStream::Refuse(message)) => return Err(ClientError::Connection(message)),
            Some(MockStream::Chunks(list)) => chunks(list).boxed(),
            Some(MockStream::ChunksThenError(list, message)) => chunks(list)
                .chain(stream::once(async move { Err(ClientError::Connection(message)) }))
                .boxed(),
            Some(MockStream::ChunksThenHang(list)) => chunks(list).chain(stream::pending()).boxed(),
            None => stream::pending().boxed(),
        })
    }
}
