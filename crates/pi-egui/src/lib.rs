//! Desktop front ends for the Raspberry Pi LCD/sensor device.
//!
//! Two windows share this library: `pi-lcd` sends two lines of text to the
//! 16x2 panel and `pi-sensor` shows the 1/0 indicator with a live sensor
//! console. All device I/O runs on a tokio runtime through `pi_client`;
//! the windows only apply the events their workers send back.

pub mod cli;
pub mod icons;
pub mod input_panel;
pub mod layout;
pub mod lcd_app;
pub mod sensor_app;
pub mod widgets;

pub use lcd_app::{LcdApp, LcdState};
pub use sensor_app::{SensorApp, SensorState};

/// Fonts and spacing applied to both windows.
pub fn setup_context(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();
    icons::add_to_fonts(&mut fonts);
    ctx.set_fonts(fonts);

    ctx.style_mut(|style| {
        style.spacing.item_spacing = layout::ITEM_SPACING;
    });
}
