//! Layout constants and frame helpers shared by both windows.

use egui::{Color32, CornerRadius, Stroke, Vec2};

/// Height of the bottom status bar.
pub const STATUS_BAR_HEIGHT: f32 = 24.0;

/// Spacing between widgets.
pub const ITEM_SPACING: Vec2 = Vec2::new(6.0, 8.0);
/// Gap between groups of widgets.
pub const SECTION_SPACING: f32 = 16.0;
/// Inner margin of cards.
pub const PANEL_PADDING: f32 = 8.0;

/// Font size of the big indicator value.
pub const INDICATOR_FONT_SIZE: f32 = 30.0;
/// Font size of the LCD preview.
pub const PREVIEW_FONT_SIZE: f32 = 14.0;

/// Rounding of card frames.
pub const CARD_ROUNDING: CornerRadius = CornerRadius::same(4);

/// Palette.
pub mod colors {
    use super::*;

    pub const SUCCESS: Color32 = Color32::from_rgb(34, 197, 94);
    pub const ERROR: Color32 = Color32::from_rgb(239, 68, 68);
    pub const WARNING: Color32 = Color32::from_rgb(234, 179, 8);
    pub const INFO: Color32 = Color32::from_rgb(59, 130, 246);

    pub const STREAMING: Color32 = SUCCESS;
    pub const IDLE: Color32 = Color32::from_rgb(156, 163, 175);
    pub const CONNECTING: Color32 = WARNING;

    /// Indicator showing `"1"`.
    pub const INDICATOR_ON: Color32 = Color32::from_rgb(0, 160, 0);
    /// Indicator showing anything else.
    pub const INDICATOR_OFF: Color32 = Color32::from_rgb(200, 0, 0);

    /// LCD preview background and text.
    pub const LCD_BACKGROUND: Color32 = Color32::BLACK;
    pub const LCD_TEXT: Color32 = Color32::from_rgb(0, 255, 0);

    pub const ACCENT: Color32 = Color32::from_rgb(0, 150, 136);
    pub const MUTED: Color32 = Color32::from_rgb(107, 114, 128);
    pub const BORDER: Color32 = Color32::from_rgb(55, 65, 81);
}

/// Bordered frame around a group of widgets.
pub fn card_frame(ui: &egui::Ui) -> egui::Frame {
    egui::Frame::new()
        .fill(ui.visuals().widgets.noninteractive.bg_fill)
        .corner_radius(CARD_ROUNDING)
        .inner_margin(PANEL_PADDING)
        .stroke(Stroke::new(1.0, colors::BORDER))
}

/// Frame that imitates the LCD glass.
pub fn lcd_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::LCD_BACKGROUND)
        .corner_radius(CARD_ROUNDING)
        .inner_margin(PANEL_PADDING)
}
