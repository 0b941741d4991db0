//! `pi-sensor`: the 1/0 indicator, enable/disable buttons and the
//! streaming console.

use std::sync::Arc;

use pi_client::{
    friendly_error_message, spawn_command_worker, ClientError, ClientEvent, Command,
    CommandSender, DeviceAddress, DeviceApi, DeviceClient, EventSink, IndicatorReading,
    StatePoller, StreamConsumer, StreamState, SwitchState, DEFAULT_EVENT_CAPACITY,
};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cli::Startup;
use crate::icons;
use crate::layout;
use crate::widgets::{indicator_label, LogConsole, StatusBar, StatusLevel};

/// Console line appended whenever streaming is requested.
pub const STREAM_STARTED_LINE: &str = "[console] streaming started ...";

/// UI-thread state of the sensor console. Only [`SensorState::apply`] and the
/// button handlers change it.
#[derive(Debug, Default)]
pub struct SensorState {
    /// Last indicator reading (`None` until the first poll lands)
    pub indicator: Option<IndicatorReading>,
    /// Console lines
    pub console: LogConsole,
    /// Stream consumer state
    pub stream: StreamState,
}

impl SensorState {
    /// Fresh state: no reading, empty console, stream idle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a worker event.
    pub fn apply(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Log(line) => self.console.push(line),
            ClientEvent::Indicator(reading) => self.indicator = Some(reading),
            ClientEvent::Stream(state) => self.stream = state,
            // Switch failures arrive as console lines from the worker
            ClientEvent::CommandFinished { .. } => {}
        }
    }

    /// "Show console" was clicked.
    pub fn on_stream_start_requested(&mut self) {
        self.console.push(STREAM_STARTED_LINE);
    }

    /// A button press that never reached the command queue.
    pub fn submit_failed(&mut self, error: &ClientError) {
        self.console.push(format!("[button error] {error}"));
    }
}

/// Background workers owned by the sensor window.
struct Workers {
    commands: CommandSender,
    poller: CancellationToken,
    stream: StreamConsumer,
}

impl Workers {
    fn spawn(runtime: &Runtime, device: Arc<dyn DeviceApi>, sink: EventSink, startup: &Startup) -> Self {
        let poller = StatePoller::new(device.clone(), sink.clone(), startup.config.poll_interval());
        let trigger = poller.trigger();
        let poller_token = poller.token();
        poller.spawn(runtime.handle());

        let (commands, _worker) = spawn_command_worker(
            runtime.handle(),
            device.clone(),
            sink.clone(),
            startup.config.command_config(),
            Some(trigger),
        );

        let stream = StreamConsumer::new(device, sink, startup.config.retry_policy());

        Self {
            commands,
            poller: poller_token,
            stream,
        }
    }

    fn shutdown(&self) {
        self.poller.cancel();
        self.stream.shutdown();
    }
}

/// The eframe application.
pub struct SensorApp {
    state: SensorState,
    status_bar: StatusBar,
    address: DeviceAddress,
    workers: Workers,
    events: mpsc::Receiver<ClientEvent>,
    runtime: Runtime,
}

impl SensorApp {
    /// Build the app and start the poller and command worker on `runtime`.
    /// The stream starts on the first "Show console" click.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        startup: Startup,
        runtime: Runtime,
    ) -> anyhow::Result<Self> {
        crate::setup_context(&cc.egui_ctx);

        let device = DeviceClient::new(&startup.address, &startup.config.http())?;
        let ctx = cc.egui_ctx.clone();
        let (sink, events) = EventSink::channel(DEFAULT_EVENT_CAPACITY);
        let sink = sink.with_repaint(move || ctx.request_repaint());

        let workers = Workers::spawn(&runtime, Arc::new(device), sink, &startup);

        tracing::info!(address = startup.address.as_str(), "Sensor console ready");
        Ok(Self {
            state: SensorState::new(),
            status_bar: StatusBar::new(),
            address: startup.address,
            workers,
            events,
            runtime,
        })
    }

    fn switch(&mut self, state: SwitchState) {
        if let Err(e) = self.workers.commands.submit(Command::Switch(state)) {
            tracing::warn!(error = %e, "Switch command not queued");
            self.status_bar.set_status(
                friendly_error_message(&e.to_string()),
                StatusLevel::Warning,
            );
            self.state.submit_failed(&e);
        }
    }

    fn show_console(&mut self) {
        if !self.workers.stream.start(self.runtime.handle()) {
            tracing::debug!("Stream consumer already running");
        }
        self.state.on_stream_start_requested();
    }
}

impl eframe::App for SensorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for event in pi_client::events::drain(&mut self.events) {
            self.state.apply(event);
        }

        self.status_bar
            .show(ctx, &self.address, Some(&self.state.stream));

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                indicator_label(ui, self.state.indicator.as_ref());
            });
            ui.add_space(layout::PANEL_PADDING);

            let mut clicked = None;
            ui.horizontal(|ui| {
                if ui
                    .button(format!("{} Enable", icons::action::ENABLE))
                    .clicked()
                {
                    clicked = Some(SwitchState::Enabled);
                }
                if ui
                    .button(format!("{} Disable", icons::action::DISABLE))
                    .clicked()
                {
                    clicked = Some(SwitchState::Disabled);
                }
                ui.add_space(layout::SECTION_SPACING);
                if ui
                    .button(format!("{} Show console", icons::action::CONSOLE))
                    .clicked()
                {
                    self.show_console();
                }
            });
            if let Some(state) = clicked {
                self.switch(state);
            }

            ui.add_space(layout::PANEL_PADDING);
            layout::card_frame(ui).show(ui, |ui| {
                self.state.console.show(ui);
            });
        });
    }
}

impl Drop for SensorApp {
    fn drop(&mut self) {
        tracing::info!("Stopping sensor workers");
        self.workers.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use pi_client::mock::{MockDevice, MockStream};
    use pi_client::{CommandConfig, RetryPolicy};
    use tokio::runtime::Handle;

    #[test]
    fn test_apply_routes_events() {
        let mut state = SensorState::new();
        assert!(state.indicator.is_none());

        state.apply(ClientEvent::Indicator(IndicatorReading::from_body("1\n")));
        state.apply(ClientEvent::Log("[sensor] 12.3 cm".into()));
        state.apply(ClientEvent::Stream(StreamState::Streaming));

        assert_eq!(state.indicator, Some(IndicatorReading::from_body("1")));
        assert_eq!(state.console.lines(), ["[sensor] 12.3 cm"]);
        assert_eq!(state.stream, StreamState::Streaming);
    }

    #[test]
    fn test_console_follows_stream_by_default() {
        assert!(SensorState::new().console.auto_scroll());
        assert!(SensorState::default().console.auto_scroll());
    }

    #[test]
    fn test_every_start_request_is_logged() {
        let mut state = SensorState::new();
        state.on_stream_start_requested();
        state.on_stream_start_requested();
        assert_eq!(state.console.len(), 2);
        assert_eq!(state.console.lines()[1], STREAM_STARTED_LINE);
    }

    #[test]
    fn test_queue_full_is_a_button_error() {
        let mut state = SensorState::new();
        state.submit_failed(&ClientError::QueueFull);
        assert!(state.console.lines()[0].starts_with("[button error] "));
    }

    async fn apply_until(
        state: &mut SensorState,
        events: &mut mpsc::Receiver<ClientEvent>,
        done: impl Fn(&SensorState) -> bool,
    ) {
        tokio::time::timeout(Duration::from_secs(30), async {
            while !done(state) {
                match events.recv().await {
                    Some(event) => state.apply(event),
                    None => break,
                }
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_then_stream_into_console() {
        let device = Arc::new(MockDevice::new());
        device.push_stream(MockStream::lines_then_hang(&["data: {\"cm\": 42.06}"]));

        let (sink, mut events) = EventSink::channel(64);
        let handle = Handle::current();

        let poller = StatePoller::new(device.clone(), sink.clone(), Duration::from_millis(500));
        let trigger = poller.trigger();
        let token = poller.token();
        poller.spawn(&handle);
        let (commands, _worker) = spawn_command_worker(
            &handle,
            device.clone(),
            sink.clone(),
            CommandConfig::default(),
            Some(trigger),
        );
        let mut stream = StreamConsumer::new(device.clone(), sink, RetryPolicy::default());

        let mut state = SensorState::new();
        apply_until(&mut state, &mut events, |s| s.indicator.is_some()).await;
        assert_eq!(state.indicator.as_ref().map(|r| r.enabled), Some(false));

        commands.submit(Command::Switch(SwitchState::Enabled)).unwrap();
        apply_until(&mut state, &mut events, |s| {
            s.indicator.as_ref().is_some_and(|r| r.enabled)
        })
        .await;
        assert_eq!(device.switch_posts(), vec![SwitchState::Enabled]);

        assert!(stream.start(&handle));
        state.on_stream_start_requested();
        apply_until(&mut state, &mut events, |s| {
            s.console.lines().iter().any(|l| l == "[sensor] 42.1 cm")
        })
        .await;
        assert_eq!(state.console.lines()[0], STREAM_STARTED_LINE);
        assert_eq!(state.stream, StreamState::Streaming);

        token.cancel();
        stream.shutdown();
        stream.join().await;
    }
}
