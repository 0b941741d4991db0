//! Messages from background workers to the UI thread.
//!
//! Workers never touch UI state. They push [`ClientEvent`]s into an
//! [`EventSink`]; the UI drains the receiving end once per frame and applies
//! them to its own state.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::commands::CommandKind;
use crate::poller::IndicatorReading;
use crate::reconnect::StreamState;

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Something the UI should know about.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Append a line to the console.
    Log(String),
    /// Latest indicator value from the poller.
    Indicator(IndicatorReading),
    /// A queued command completed.
    CommandFinished {
        /// Which command ran
        command: CommandKind,
        /// `Err` carries the display string of the failure
        result: Result<(), String>,
    },
    /// The stream consumer changed state.
    Stream(StreamState),
}

/// Wake-up hook run after each event (e.g. `egui::Context::request_repaint`).
pub type RepaintFn = Arc<dyn Fn() + Send + Sync>;

/// Sending half of the worker -> UI channel.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<ClientEvent>,
    repaint: Option<RepaintFn>,
}

impl EventSink {
    /// Create a sink and the receiver the UI thread drains.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ClientEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, repaint: None }, rx)
    }

    /// Run `repaint` after every delivered event.
    #[must_use]
    pub fn with_repaint(mut self, repaint: impl Fn() + Send + Sync + 'static) -> Self {
        self.repaint = Some(Arc::new(repaint));
        self
    }

    /// Deliver an event. Returns `false` once the UI side has gone away.
    pub async fn emit(&self, event: ClientEvent) -> bool {
        if self.tx.send(event).await.is_err() {
            tracing::debug!("Event receiver dropped");
            return false;
        }
        if let Some(repaint) = &self.repaint {
            repaint();
        }
        true
    }

    /// Append a console line.
    pub async fn log(&self, line: impl Into<String>) -> bool {
        self.emit(ClientEvent::Log(line.into())).await
    }

    /// Returns true if the receiving side has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Drain every event currently queued, without waiting.
pub fn drain(rx: &mut mpsc::Receiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_emit_runs_repaint_hook() {
        let wakeups = Arc::new(AtomicUsize::new(0));
        let counter = wakeups.clone();
        let (sink, mut rx) = EventSink::channel(4);
        let sink = sink.with_repaint(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(sink.log("one").await);
        assert!(sink.log("two").await);

        assert_eq!(wakeups.load(Ordering::SeqCst), 2);
        assert_eq!(
            drain(&mut rx),
            vec![
                ClientEvent::Log("one".into()),
                ClientEvent::Log("two".into())
            ]
        );
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_emit_after_receiver_dropped() {
        let (sink, rx) = EventSink::channel(1);
        drop(rx);
        assert!(sink.is_closed());
        assert!(!sink.log("lost").await);
    }
}
