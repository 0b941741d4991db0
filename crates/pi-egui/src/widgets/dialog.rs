//! Modal-style message window for command results.

use crate::icons;
use crate::layout::colors;

/// Success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    /// Command went through
    Info,
    /// Command failed
    Error,
}

/// A message waiting for the user to dismiss it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDialog {
    /// Result kind
    pub kind: DialogKind,
    /// Body text
    pub message: String,
}

impl MessageDialog {
    /// Success dialog.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Info,
            message: message.into(),
        }
    }

    /// Failure dialog.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Error,
            message: message.into(),
        }
    }

    /// Window title.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self.kind {
            DialogKind::Info => "Success",
            DialogKind::Error => "Error",
        }
    }

    /// Render the window. Returns `true` once the user dismisses it.
    pub fn show(&self, ctx: &egui::Context) -> bool {
        let (icon, color) = match self.kind {
            DialogKind::Info => (icons::status::SUCCESS, colors::SUCCESS),
            DialogKind::Error => (icons::status::ERROR, colors::ERROR),
        };

        let mut dismissed = false;
        egui::Window::new(self.title())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(icon).color(color).size(20.0));
                    ui.label(&self.message);
                });
                ui.separator();
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            dismissed = true;
        }
        dismissed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles() {
        assert_eq!(MessageDialog::info("LCD updated!").title(), "Success");
        let err = MessageDialog::error("timed out");
        assert_eq!(err.title(), "Error");
        assert_eq!(err.message, "timed out");
    }
}
