//! Text fields with Enter-to-advance behaviour.
//!
//! Enter on any field but the last moves focus to the next one; Enter on the
//! last field submits. Over-length input is accepted here and truncated only
//! when sent.

/// One labelled text field.
#[derive(Debug, Clone)]
pub struct TextField {
    /// Label shown above the field
    pub label: String,
    /// Declared maximum length (advisory, shown in the label)
    pub max_len: usize,
    /// Current contents
    pub text: String,
}

impl TextField {
    /// Empty field labelled `"<name> (max <n> chars)"`.
    #[must_use]
    pub fn new(name: &str, max_len: usize) -> Self {
        Self {
            label: format!("{name} (max {max_len} chars)"),
            max_len,
            text: String::new(),
        }
    }
}

/// What the user asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    /// Nothing to do
    None,
    /// Focus moved to the field at this index
    FocusNext(usize),
    /// Submit the form (Enter on the last field or the submit button)
    Submit,
}

/// Ordered set of fields.
#[derive(Debug, Clone)]
pub struct InputPanel {
    id: egui::Id,
    fields: Vec<TextField>,
    pending_focus: Option<usize>,
}

impl InputPanel {
    /// Panel with `fields`; the first field gets focus on the first frame.
    #[must_use]
    pub fn new(id: impl std::hash::Hash, fields: Vec<TextField>) -> Self {
        let pending_focus = (!fields.is_empty()).then_some(0);
        Self {
            id: egui::Id::new(id),
            fields,
            pending_focus,
        }
    }

    /// Text of the field at `index` (empty if out of range).
    #[must_use]
    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map_or("", |f| f.text.as_str())
    }

    /// Replace the text of the field at `index`.
    pub fn set_value(&mut self, index: usize, text: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(index) {
            field.text = text.into();
        }
    }

    /// Fields in order.
    #[must_use]
    pub fn fields(&self) -> &[TextField] {
        &self.fields
    }

    /// Handle Enter pressed in the field at `index`.
    pub fn on_enter(&mut self, index: usize) -> PanelAction {
        if index + 1 < self.fields.len() {
            self.pending_focus = Some(index + 1);
            PanelAction::FocusNext(index + 1)
        } else {
            PanelAction::Submit
        }
    }

    /// Render the fields and report Enter presses.
    pub fn show(&mut self, ui: &mut egui::Ui) -> PanelAction {
        let mut action = PanelAction::None;
        let focus = self.pending_focus.take();

        for index in 0..self.fields.len() {
            let field = &mut self.fields[index];
            ui.label(&field.label);
            let response = ui.add(
                egui::TextEdit::singleline(&mut field.text)
                    .id(self.id.with(index))
                    .font(egui::TextStyle::Monospace)
                    .desired_width(f32::INFINITY),
            );

            if focus == Some(index) {
                response.request_focus();
            }
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                action = self.on_enter(index);
            }
        }

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcd_panel() -> InputPanel {
        InputPanel::new(
            "lcd",
            vec![TextField::new("Line 1", 16), TextField::new("Line 2", 16)],
        )
    }

    #[test]
    fn test_labels_show_max_length() {
        let panel = lcd_panel();
        assert_eq!(panel.fields()[0].label, "Line 1 (max 16 chars)");
        assert_eq!(panel.fields()[1].max_len, 16);
    }

    #[test]
    fn test_enter_advances_then_submits() {
        let mut panel = lcd_panel();
        assert_eq!(panel.on_enter(0), PanelAction::FocusNext(1));
        assert_eq!(panel.on_enter(1), PanelAction::Submit);
    }

    /// One frame of `panel` in a headless context, optionally pressing Enter.
    fn frame(ctx: &egui::Context, panel: &mut InputPanel, enter: bool) -> PanelAction {
        let events = if enter {
            vec![egui::Event::Key {
                key: egui::Key::Enter,
                physical_key: None,
                pressed: true,
                repeat: false,
                modifiers: egui::Modifiers::NONE,
            }]
        } else {
            Vec::new()
        };
        let input = egui::RawInput {
            events,
            ..Default::default()
        };

        let mut action = PanelAction::None;
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                let shown = panel.show(ui);
                if shown != PanelAction::None {
                    action = shown;
                }
            });
        });
        action
    }

    #[test]
    fn test_enter_key_walks_the_fields() {
        let ctx = egui::Context::default();
        let mut panel = lcd_panel();

        assert_eq!(frame(&ctx, &mut panel, false), PanelAction::None);
        assert!(ctx.memory(|m| m.has_focus(egui::Id::new("lcd").with(0))));

        assert_eq!(frame(&ctx, &mut panel, true), PanelAction::FocusNext(1));
        assert_eq!(frame(&ctx, &mut panel, false), PanelAction::None);
        assert!(ctx.memory(|m| m.has_focus(egui::Id::new("lcd").with(1))));

        assert_eq!(frame(&ctx, &mut panel, true), PanelAction::Submit);
    }

    #[test]
    fn test_over_length_input_is_kept() {
        let mut panel = lcd_panel();
        panel.set_value(0, "this is far longer than sixteen");
        assert_eq!(panel.value(0), "this is far longer than sixteen");
        assert_eq!(panel.value(1), "");
        assert_eq!(panel.value(5), "");
    }
}
