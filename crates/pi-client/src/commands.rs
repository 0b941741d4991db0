//! Outbound commands (LCD text, switch toggles).
//!
//! One worker task drains a bounded queue, so rapid clicking cannot pile up
//! threads or requests. Each command is tried exactly once; the outcome goes
//! back to the UI as [`ClientEvent::CommandFinished`].

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::{DeviceApi, SwitchState};
use crate::error::{ClientError, Result};
use crate::events::{ClientEvent, EventSink};
use crate::lcd::LcdPayload;
use crate::poller::PollTrigger;

/// A request for the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write both LCD lines
    Lcd(LcdPayload),
    /// Set the remote actuator
    Switch(SwitchState),
    /// Blank the LCD (failures are not reported to the user)
    ClearLcd,
}

impl Command {
    /// Kind tag used in results.
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Lcd(_) => CommandKind::Lcd,
            Self::Switch(state) => CommandKind::Switch(*state),
            Self::ClearLcd => CommandKind::ClearLcd,
        }
    }
}

/// Which command a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `POST /lcd` with user text
    Lcd,
    /// `POST /button`
    Switch(SwitchState),
    /// `POST /lcd` with blanks
    ClearLcd,
}

impl CommandKind {
    /// Short label for logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Lcd => "lcd",
            Self::Switch(_) => "switch",
            Self::ClearLcd => "clear_lcd",
        }
    }
}

/// Worker settings.
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// Maximum queued commands before [`ClientError::QueueFull`]
    pub queue_capacity: usize,
    /// Blank the LCD before each text update
    pub clear_before_send: bool,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 8,
            clear_before_send: true,
        }
    }
}

/// UI-side handle for queueing commands.
#[derive(Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<Command>,
}

impl CommandSender {
    /// Queue a command without blocking.
    pub fn submit(&self, command: Command) -> Result<()> {
        let kind = command.kind();
        self.tx.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                tracing::warn!(command = kind.label(), "Command queue full, dropping command");
                ClientError::QueueFull
            }
            mpsc::error::TrySendError::Closed(_) => ClientError::ChannelClosed,
        })
    }
}

/// Spawn the command worker.
///
/// When `poll_trigger` is given, a successful switch command asks the poller
/// for an immediate read so the indicator shows what the device acknowledged.
pub fn spawn_command_worker(
    handle: &Handle,
    device: Arc<dyn DeviceApi>,
    sink: EventSink,
    config: CommandConfig,
    poll_trigger: Option<PollTrigger>,
) -> (CommandSender, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let worker = CommandWorker {
        device,
        sink,
        clear_before_send: config.clear_before_send,
        poll_trigger,
    };
    let task = handle.spawn(worker.run(rx));
    (CommandSender { tx }, task)
}

struct CommandWorker {
    device: Arc<dyn DeviceApi>,
    sink: EventSink,
    clear_before_send: bool,
    poll_trigger: Option<PollTrigger>,
}

impl CommandWorker {
    async fn run(self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            let kind = command.kind();
            let result = self.execute(command).await;

            match &result {
                Ok(()) => tracing::info!(command = kind.label(), "Command succeeded"),
                Err(e) if kind == CommandKind::ClearLcd => {
                    tracing::debug!(error = %e, "LCD clear failed (ignored)");
                }
                Err(e) => {
                    tracing::warn!(command = kind.label(), kind = e.kind().label(), error = %e, "Command failed");
                }
            }

            if let CommandKind::Switch(_) = kind {
                match &result {
                    Ok(()) => {
                        if let Some(trigger) = &self.poll_trigger {
                            trigger.poll_now();
                        }
                    }
                    Err(e) => {
                        if !self.sink.log(format!("[button error] {e}")).await {
                            break;
                        }
                    }
                }
            }

            let event = ClientEvent::CommandFinished {
                command: kind,
                result: result.map_err(|e| e.to_string()),
            };
            if !self.sink.emit(event).await {
                break;
            }
        }
        tracing::debug!("Command worker stopped");
    }

    async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::Lcd(payload) => {
                if self.clear_before_send {
                    if let Err(e) = self.device.send_lcd(&LcdPayload::blank()).await {
                        tracing::debug!(error = %e, "LCD clear before send failed (ignored)");
                    }
                }
                self.device.send_lcd(&payload).await
            }
            Command::Switch(state) => self.device.set_switch(state).await,
            Command::ClearLcd => self.device.send_lcd(&LcdPayload::blank()).await,
        }
    }
}
