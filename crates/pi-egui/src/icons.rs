//! Icon library using egui-phosphor.

pub use egui_phosphor::regular::*;
pub use egui_phosphor::Variant;

/// Register the phosphor glyphs with egui's fonts.
pub fn add_to_fonts(fonts: &mut egui::FontDefinitions) {
    egui_phosphor::add_to_fonts(fonts, Variant::Regular);
}

/// Button icons.
pub mod action {
    use super::*;
    pub const SEND: &str = PAPER_PLANE_RIGHT;
    pub const ENABLE: &str = TOGGLE_RIGHT;
    pub const DISABLE: &str = TOGGLE_LEFT;
    pub const CONSOLE: &str = TERMINAL_WINDOW;
}

/// Status bar and dialog icons.
pub mod status {
    use super::*;
    pub const SUCCESS: &str = CHECK_CIRCLE;
    pub const ERROR: &str = X_CIRCLE;
    pub const WARNING: &str = WARNING_CIRCLE;
    pub const INFO: &str = super::INFO;
    pub const LOADING: &str = SPINNER;
    pub const CONNECTED: &str = WIFI_HIGH;
    pub const DISCONNECTED: &str = WIFI_SLASH;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icons_are_non_empty() {
        assert!(!action::SEND.is_empty());
        assert!(!status::CONNECTED.is_empty());
        assert_ne!(status::SUCCESS, status::ERROR);
    }
}
