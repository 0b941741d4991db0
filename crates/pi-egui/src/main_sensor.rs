//! Pi ultrasonic indicator and sensor console.

use clap::Parser;
use pi_egui::cli::{self, CliArgs};
use pi_egui::SensorApp;

const TITLE: &str = "Pi Ultrasonic 1/0  +  Console";

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let startup = cli::startup(&args)?;
    let runtime = cli::build_runtime()?;

    tracing::info!("Starting sensor console");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([400.0, 300.0])
            .with_min_inner_size([320.0, 240.0])
            .with_title(TITLE),
        ..Default::default()
    };

    eframe::run_native(
        TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(SensorApp::new(cc, startup, runtime)?))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
