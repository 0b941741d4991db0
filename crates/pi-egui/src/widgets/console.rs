//! Read-only, append-only text console.

/// Lines in arrival order. Never deduplicated or trimmed.
#[derive(Debug)]
pub struct LogConsole {
    lines: Vec<String>,
    auto_scroll: bool,
}

impl Default for LogConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl LogConsole {
    /// Empty console that follows new lines.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            auto_scroll: true,
        }
    }

    /// Append one line.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// All lines so far.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns true while the view sticks to the newest line.
    #[must_use]
    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    /// Render the console filling the available space.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.checkbox(&mut self.auto_scroll, "Auto-scroll");
            ui.label(
                egui::RichText::new(format!("{} lines", self.lines.len()))
                    .small()
                    .color(crate::layout::colors::MUTED),
            );
        });

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(self.auto_scroll)
            .show(ui, |ui| {
                for line in &self.lines {
                    ui.monospace(line);
                }
            });
    }
}
