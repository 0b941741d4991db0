//! Periodic indicator polling (`GET /distance`).
//!
//! A single task owns the schedule, so polls never overlap and results reach
//! the UI in the order they were taken. A failed poll is never fatal: the
//! reading falls back to the disabled default and the next tick goes ahead as
//! planned.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::api::DeviceApi;
use crate::events::{ClientEvent, EventSink};

/// Value shown when no successful reading is available.
pub const DEFAULT_READING: &str = "0";

/// The indicator value the UI displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorReading {
    /// Trimmed response body (or `"0"` after a failure)
    pub value: String,
    /// True only for `"1"`
    pub enabled: bool,
}

impl IndicatorReading {
    /// Interpret a `/distance` response body.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        let value = body.trim().to_string();
        let enabled = value == "1";
        Self { value, enabled }
    }

    /// Disabled default used when a poll fails.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            value: DEFAULT_READING.to_string(),
            enabled: false,
        }
    }
}

impl Default for IndicatorReading {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Handle that asks the poller to poll right away instead of waiting for
/// the next tick.
#[derive(Debug, Clone, Default)]
pub struct PollTrigger {
    notify: Arc<Notify>,
}

impl PollTrigger {
    /// Request an immediate poll. Requests made while a poll is running
    /// collapse into one extra poll.
    pub fn poll_now(&self) {
        self.notify.notify_one();
    }

    pub(crate) async fn requested(&self) {
        self.notify.notified().await;
    }
}

/// Fixed-interval indicator poller.
pub struct StatePoller {
    device: Arc<dyn DeviceApi>,
    sink: EventSink,
    interval: Duration,
    trigger: PollTrigger,
    token: CancellationToken,
}

impl StatePoller {
    /// Create a poller; nothing runs until [`StatePoller::spawn`].
    #[must_use]
    pub fn new(device: Arc<dyn DeviceApi>, sink: EventSink, interval: Duration) -> Self {
        Self {
            device,
            sink,
            interval,
            trigger: PollTrigger::default(),
            token: CancellationToken::new(),
        }
    }

    /// Handle for out-of-schedule polls.
    #[must_use]
    pub fn trigger(&self) -> PollTrigger {
        self.trigger.clone()
    }

    /// Token that stops the poller when cancelled.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Start polling on `handle`. The first poll happens immediately.
    pub fn spawn(self, handle: &Handle) -> JoinHandle<()> {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Starting state poller");
        handle.spawn(self.run())
    }

    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        // A slow poll delays the schedule instead of causing a burst afterwards.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {}
                _ = self.trigger.requested() => {
                    tracing::trace!("Immediate poll requested");
                }
            }

            let reading = tokio::select! {
                _ = self.token.cancelled() => break,
                reading = poll_once(self.device.as_ref(), &self.sink) => reading,
            };

            if !self.sink.emit(ClientEvent::Indicator(reading)).await {
                break;
            }
        }

        tracing::info!("State poller stopped");
    }
}

/// Perform one poll. Failures are logged, reported to the console, and
/// mapped to [`IndicatorReading::fallback`].
pub async fn poll_once(device: &dyn DeviceApi, sink: &EventSink) -> IndicatorReading {
    match device.read_indicator().await {
        Ok(body) => IndicatorReading::from_body(&body),
        Err(e) => {
            tracing::warn!(error = %e, kind = e.kind().label(), "Indicator poll failed");
            sink.log(format!("[poll error] {e}")).await;
            IndicatorReading::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDevice;
    use tokio::sync::mpsc;

    async fn next_reading(rx: &mut mpsc::Receiver<ClientEvent>) -> IndicatorReading {
        loop {
            match rx.recv().await {
                Some(ClientEvent::Indicator(reading)) => return reading,
                Some(_) => continue,
                None => panic!("poller stopped"),
            }
        }
    }

    #[test]
    fn test_reading_from_body() {
        let on = IndicatorReading::from_body("1\n");
        assert!(on.enabled);
        assert_eq!(on.value, "1");

        let off = IndicatorReading::from_body(" 0 ");
        assert!(!off.enabled);
        assert_eq!(off.value, "0");

        let odd = IndicatorReading::from_body("11");
        assert!(!odd.enabled);
        assert_eq!(odd.value, "11");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_poll_falls_back_and_keeps_polling() {
        let device = Arc::new(MockDevice::new());
        device.push_indicator(Ok("1"));
        device.push_indicator(Err("connection refused"));
        device.push_indicator(Ok("1"));

        let (sink, mut rx) = EventSink::channel(32);
        let poller = StatePoller::new(device.clone(), sink, Duration::from_millis(500));
        let token = poller.token();
        let task = poller.spawn(&Handle::current());

        let mut events = Vec::new();
        while events
            .iter()
            .filter(|e| matches!(e, ClientEvent::Indicator(_)))
            .count()
            < 3
        {
            events.push(rx.recv().await.unwrap());
        }
        token.cancel();
        task.await.unwrap();

        assert_eq!(events.len(), 4);
        assert_eq!(events[0], ClientEvent::Indicator(IndicatorReading::from_body("1")));
        assert!(matches!(&events[1], ClientEvent::Log(line) if line.starts_with("[poll error]")));
        assert_eq!(events[2], ClientEvent::Indicator(IndicatorReading::fallback()));
        assert_eq!(events[3], ClientEvent::Indicator(IndicatorReading::from_body("1")));
        assert_eq!(device.indicator_reads(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_is_logged_to_console() {
        let device = Arc::new(MockDevice::new());
        device.push_indicator(Err("connection refused"));

        let (sink, mut rx) = EventSink::channel(32);
        let reading = poll_once(device.as_ref(), &sink).await;

        assert_eq!(reading, IndicatorReading::fallback());
        match rx.try_recv() {
            Ok(ClientEvent::Log(line)) => {
                assert!(line.starts_with("[poll error] "), "{line}");
                assert!(line.contains("connection refused"));
            }
            other => panic!("expected log line, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_follow_interval() {
        let device = Arc::new(MockDevice::new());
        device.set_indicator("0");

        let (sink, mut rx) = EventSink::channel(32);
        let poller = StatePoller::new(device.clone(), sink, Duration::from_millis(500));
        let token = poller.token();
        let _task = poller.spawn(&Handle::current());

        let start = tokio::time::Instant::now();
        for _ in 0..3 {
            next_reading(&mut rx).await;
        }
        // Ticks at 0, 500 and 1000 ms
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1500), "{elapsed:?}");
        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_polls_immediately() {
        let device = Arc::new(MockDevice::new());
        device.set_indicator("0");

        let (sink, mut rx) = EventSink::channel(32);
        let poller = StatePoller::new(device.clone(), sink, Duration::from_secs(60));
        let trigger = poller.trigger();
        let token = poller.token();
        let _task = poller.spawn(&Handle::current());

        // First tick fires at once
        assert_eq!(next_reading(&mut rx).await.value, "0");

        device.set_indicator("1");
        let start = tokio::time::Instant::now();
        trigger.poll_now();
        assert!(next_reading(&mut rx).await.enabled);
        assert!(start.elapsed() < Duration::from_secs(1));
        token.cancel();
    }
}
