//! Pi 16x2 LCD sender.

use clap::Parser;
use pi_egui::cli::{self, CliArgs};
use pi_egui::LcdApp;

const TITLE: &str = "Pi 16×2 LCD Sender";

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let startup = cli::startup(&args)?;
    let runtime = cli::build_runtime()?;

    tracing::info!("Starting LCD sender");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([400.0, 260.0])
            .with_min_inner_size([360.0, 220.0])
            .with_title(TITLE),
        ..Default::default()
    };

    eframe::run_native(
        TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(LcdApp::new(cc, startup, runtime)?))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
