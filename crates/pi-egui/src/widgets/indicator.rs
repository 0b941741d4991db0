//! Big colored label showing the polled device state.

use pi_client::IndicatorReading;

use crate::layout::{self, colors};

/// Placeholder shown before the first poll completes.
pub const NO_READING: &str = "\u{2013}";

/// Text and color for `reading`.
#[must_use]
pub fn indicator_style(reading: Option<&IndicatorReading>) -> (&str, egui::Color32) {
    match reading {
        None => (NO_READING, colors::MUTED),
        Some(r) if r.enabled => (r.value.as_str(), colors::INDICATOR_ON),
        Some(r) => (r.value.as_str(), colors::INDICATOR_OFF),
    }
}

/// Render the indicator centered in the current row.
pub fn indicator_label(ui: &mut egui::Ui, reading: Option<&IndicatorReading>) -> egui::Response {
    let (text, color) = indicator_style(reading);
    ui.vertical_centered(|ui| {
        ui.label(
            egui::RichText::new(text)
                .size(layout::INDICATOR_FONT_SIZE)
                .color(color)
                .strong(),
        )
    })
    .inner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_is_green_everything_else_red() {
        let on = IndicatorReading::from_body("1");
        assert_eq!(indicator_style(Some(&on)), ("1", colors::INDICATOR_ON));

        let off = IndicatorReading::from_body("0");
        assert_eq!(indicator_style(Some(&off)), ("0", colors::INDICATOR_OFF));

        let odd = IndicatorReading::from_body("maybe");
        assert_eq!(indicator_style(Some(&odd)).1, colors::INDICATOR_OFF);

        assert_eq!(
            indicator_style(Some(&IndicatorReading::fallback())),
            ("0", colors::INDICATOR_OFF)
        );
        assert_eq!(indicator_style(None).0, NO_READING);
    }
}
