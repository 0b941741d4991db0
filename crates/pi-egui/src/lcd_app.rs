//! `pi-lcd`: two text fields, a send button and a preview of the panel.

use std::sync::Arc;

use pi_client::{
    friendly_error_message, lcd::preview_lines, spawn_command_worker, ClientEvent, Command,
    CommandKind, CommandSender, DeviceAddress, DeviceClient, EventSink, LcdPayload,
    DEFAULT_EVENT_CAPACITY, LCD_LINE_WIDTH,
};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cli::Startup;
use crate::icons;
use crate::input_panel::{InputPanel, PanelAction, TextField};
use crate::layout::{self, colors};
use crate::widgets::{MessageDialog, StatusBar, StatusLevel};

/// Message shown after the device accepted the text.
pub const SUCCESS_MESSAGE: &str = "LCD updated!";

/// UI-thread state of the LCD sender.
#[derive(Debug)]
pub struct LcdState {
    /// Line 1 and line 2 inputs
    pub panel: InputPanel,
    /// Padded preview, refreshed on send
    pub preview: [String; 2],
    /// Result waiting to be acknowledged
    pub dialog: Option<MessageDialog>,
}

impl Default for LcdState {
    fn default() -> Self {
        Self::new()
    }
}

impl LcdState {
    /// Empty fields, blank preview.
    #[must_use]
    pub fn new() -> Self {
        let panel = InputPanel::new(
            "lcd_lines",
            vec![
                TextField::new("Line 1", LCD_LINE_WIDTH),
                TextField::new("Line 2", LCD_LINE_WIDTH),
            ],
        );
        Self {
            panel,
            preview: preview_lines("", ""),
            dialog: None,
        }
    }

    /// Refresh the preview from the fields and build the payload to send.
    pub fn prepare_send(&mut self) -> LcdPayload {
        let (line1, line2) = (self.panel.value(0), self.panel.value(1));
        self.preview = preview_lines(line1, line2);
        LcdPayload::new(line1, line2)
    }

    /// Apply a worker event.
    pub fn apply(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::CommandFinished {
                command: CommandKind::Lcd,
                result,
            } => {
                self.dialog = Some(match result {
                    Ok(()) => MessageDialog::info(SUCCESS_MESSAGE),
                    Err(e) => MessageDialog::error(friendly_error_message(&e)),
                });
            }
            ClientEvent::CommandFinished { .. } => {}
            ClientEvent::Log(line) => tracing::debug!(line = %line, "Worker log line"),
            ClientEvent::Indicator(_) | ClientEvent::Stream(_) => {}
        }
    }

    /// Report a command that never made it into the queue.
    pub fn submit_failed(&mut self, error: &pi_client::ClientError) {
        self.dialog = Some(MessageDialog::error(friendly_error_message(&error.to_string())));
    }
}

/// The eframe application.
pub struct LcdApp {
    state: LcdState,
    status_bar: StatusBar,
    address: DeviceAddress,
    commands: CommandSender,
    events: mpsc::Receiver<ClientEvent>,
    worker: JoinHandle<()>,
    _runtime: Runtime,
}

impl LcdApp {
    /// Build the app and start its command worker on `runtime`.
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

        let (commands, worker) = spawn_command_worker(
            runtime.handle(),
            Arc::new(device),
            sink,
            startup.config.command_config(),
            None,
        );

        // Start from a blank panel
        if let Err(e) = commands.submit(Command::ClearLcd) {
            tracing::debug!(error = %e, "Initial LCD clear not queued");
        }

        tracing::info!(address = startup.address.as_str(), "LCD sender ready");
        Ok(Self {
            state: LcdState::new(),
            status_bar: StatusBar::new(),
            address: startup.address,
            commands,
            events,
            worker,
            _runtime: runtime,
        })
    }

    fn send(&mut self) {
        let payload = self.state.prepare_send();
        match self.commands.submit(Command::Lcd(payload)) {
            Ok(()) => self.status_bar.set_status("Sending...", StatusLevel::Info),
            Err(e) => {
                tracing::warn!(error = %e, "LCD update not queued");
                self.status_bar
                    .set_status(friendly_error_message(&e.to_string()), StatusLevel::Warning);
                self.state.submit_failed(&e);
            }
        }
    }

    fn drain_events(&mut self) {
        for event in pi_client::events::drain(&mut self.events) {
            if let ClientEvent::CommandFinished {
                command: CommandKind::Lcd,
                result,
            } = &event
            {
                match result {
                    Ok(()) => self.status_bar.set_status(SUCCESS_MESSAGE, StatusLevel::Success),
                    Err(e) => self
                        .status_bar
                        .set_status(friendly_error_message(e), StatusLevel::Error),
                }
            }
            self.state.apply(event);
        }
    }
}

impl eframe::App for LcdApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        if self.worker.is_finished() {
            self.status_bar
                .set_status("Command worker stopped", StatusLevel::Error);
        }

        self.status_bar.show(ctx, &self.address, None);

        egui::CentralPanel::default().show(ctx, |ui| {
            let mut submit = self.state.panel.show(ui) == PanelAction::Submit;

            ui.add_space(layout::PANEL_PADDING);
            ui.vertical_centered(|ui| {
                let button = egui::Button::new(
                    egui::RichText::new(format!("Send to LCD  {}", icons::action::SEND)).strong(),
                )
                .fill(colors::ACCENT);
                if ui.add(button).clicked() {
                    submit = true;
                }

                ui.add_space(layout::PANEL_PADDING);
                layout::lcd_frame().show(ui, |ui| {
                    for line in &self.state.preview {
                        ui.label(
                            egui::RichText::new(line)
                                .monospace()
                                .size(layout::PREVIEW_FONT_SIZE)
                                .color(colors::LCD_TEXT),
                        );
                    }
                });
            });

            if submit {
                self.send();
            }
        });

        if let Some(dialog) = &self.state.dialog {
            if dialog.show(ctx) {
                self.state.dialog = None;
            }
        }
    }
}
