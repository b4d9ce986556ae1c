mod backend_bridge;
mod controller;
mod settings;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;

use crate::{
    backend_bridge::commands::BackendCommand, controller::events::UiEvent, ui::AdvisorApp,
};

#[derive(Parser, Debug)]
struct Args {
    /// Overrides the configured backend base URL.
    #[arg(long)]
    server_url: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = settings::load_settings();
    if let Some(server_url) = args.server_url {
        settings.backend_url = server_url;
    }
    if let Err(err) = settings::validate_backend_url(&settings.backend_url) {
        tracing::warn!("configured backend url looks wrong: {err}");
    }

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Smart Farming Assistant")
            .with_inner_size([720.0, 640.0])
            .with_min_inner_size([560.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Smart Farming Assistant",
        options,
        Box::new(|_cc| Ok(Box::new(AdvisorApp::new(cmd_tx, ui_rx)))),
    )
}
