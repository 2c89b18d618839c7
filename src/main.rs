use eframe::egui;
use std::path::PathBuf;

mod app;
mod logging;

use jonnybox::config::AppConfig;

fn main() -> eframe::Result<()> {
    // Keep the guard alive for the duration of the program
    let _log_guard = logging::setup_logging();

    let open = std::env::args().nth(1).map(PathBuf::from);
    if let Some(path) = &open {
        if !path.exists() {
            eprintln!("File not found: {}", path.display());
            eprintln!("Usage: jonnybox [image.png|jpg|project.json]");
            std::process::exit(1);
        }
    }

    let config = AppConfig::load();
    tracing::info!(path = ?config.config_path, "starting jonnybox");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Jonnybox"),
        ..Default::default()
    };

    eframe::run_native(
        "Jonnybox",
        options,
        Box::new(move |_cc| Ok(Box::new(app::JonnyboxApp::new(config, open)))),
    )
}
