//! Reusable widgets.

pub mod console;
pub mod dialog;
pub mod indicator;
pub mod status_bar;

pub use console::LogConsole;
pub use dialog::{DialogKind, MessageDialog};
pub use indicator::indicator_label;
pub use status_bar::{StatusBar, StatusLevel};
