//! Status bar widget.
//!
//! Displays the device address, transient status messages, and the stream
//! state in a fixed-height bottom panel.

use std::time::{Duration, Instant};

use pi_client::{DeviceAddress, StreamState};

use crate::icons;
use crate::layout::{self, colors};

/// How long transient messages stay visible.
const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Status bar widget.
///
/// The status bar has three sections:
/// - **Left**: Device address and where it came from
/// - **Center**: Transient status message (with automatic timeout)
/// - **Right**: Stream indicator (sensor console only) and version number
#[derive(Default)]
pub struct StatusBar {
    status_message: Option<StatusMessage>,
}

/// A transient status message with automatic timeout.
#[derive(Clone)]
pub struct StatusMessage {
    /// The message text
    pub text: String,
    /// The message level (determines styling)
    pub level: StatusLevel,
    /// When this message was created
    pub created_at: Instant,
    /// How long to show this message
    pub duration: Duration,
}

/// Level/severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Informational message
    Info,
    /// Success message
    Success,
    /// Warning message
    Warning,
    /// Error message
    Error,
}

impl StatusLevel {
    /// Get the icon for this status level.
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Info => icons::status::INFO,
            Self::Success => icons::status::SUCCESS,
            Self::Warning => icons::status::WARNING,
            Self::Error => icons::status::ERROR,
        }
    }

    /// Get the color for this status level.
    #[must_use]
    pub fn color(self) -> egui::Color32 {
        match self {
            Self::Info => colors::INFO,
            Self::Success => colors::SUCCESS,
            Self::Warning => colors::WARNING,
            Self::Error => colors::ERROR,
        }
    }
}

/// Icon, color and tooltip for a stream state.
#[must_use]
pub fn stream_indicator(state: &StreamState) -> (&'static str, egui::Color32, String) {
    match state {
        StreamState::Idle => (
            icons::status::DISCONNECTED,
            colors::IDLE,
            "Stream not started".to_string(),
        ),
        StreamState::Connecting { attempt } => (
            icons::status::LOADING,
            colors::CONNECTING,
            format!("Connecting (attempt {attempt})"),
        ),
        StreamState::Streaming => (
            icons::status::CONNECTED,
            colors::STREAMING,
            "Streaming sensor data".to_string(),
        ),
        StreamState::Backoff { delay, protocol, .. } => (
            if *protocol {
                icons::status::ERROR
            } else {
                icons::status::LOADING
            },
            if *protocol { colors::ERROR } else { colors::WARNING },
            format!(
                "Retrying in {:.1}s: {}",
                delay.as_secs_f64(),
                state.error_message().unwrap_or_default()
            ),
        ),
    }
}

impl StatusBar {
    /// Create a new status bar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a transient status message.
    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            level,
            created_at: Instant::now(),
            duration: STATUS_TIMEOUT,
        });
    }

    /// Current message, if not expired.
    #[must_use]
    pub fn status(&self) -> Option<&StatusMessage> {
        self.status_message.as_ref()
    }

    /// Check and clear expired status messages.
    fn check_status_expiry(&mut self) {
        if let Some(ref msg) = self.status_message {
            if msg.created_at.elapsed() >= msg.duration {
                self.status_message = None;
            }
        }
    }

    /// Render the status bar.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        address: &DeviceAddress,
        stream: Option<&StreamState>,
    ) {
        self.check_status_expiry();

        egui::TopBottomPanel::bottom("app_status_bar")
            .exact_height(layout::STATUS_BAR_HEIGHT)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(egui::RichText::new(address.as_str()).small().color(colors::MUTED))
                        .on_hover_text(format!("Device address from {}", address.source()));

                    ui.add_space(8.0);
                    self.render_status_message(ui);

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                                .small()
                                .color(colors::MUTED),
                        );

                        if let Some(state) = stream {
                            ui.add_space(8.0);
                            let (icon, color, tooltip) = stream_indicator(state);
                            ui.label(egui::RichText::new(icon).color(color).size(16.0))
                                .on_hover_text(tooltip);
                            ui.label(egui::RichText::new(state.label()).small().color(color));
                        }
                    });
                });
            });
    }

    fn render_status_message(&self, ui: &mut egui::Ui) {
        if let Some(ref msg) = self.status_message {
            let color = msg.level.color();
            ui.label(egui::RichText::new(msg.level.icon()).color(color).size(14.0));
            ui.label(egui::RichText::new(&msg.text).small().color(color));

            // Repaint once the message is due to expire
            let remaining = msg.duration.saturating_sub(msg.created_at.elapsed());
            ui.ctx().request_repaint_after(remaining);
        }
    }
}
