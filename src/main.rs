// GUI-subsystem binary on Windows: no console window is allocated for the
// editor. Headless replay reports through the exit code and the session log.
#![windows_subsystem = "windows"]

use doodlepad::app::DoodlepadApp;
use doodlepad::cli::{self, CliArgs};
use doodlepad::logger;
use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    if CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = CliArgs::parse();
        logger::init();
        let code = cli::run(args);
        std::process::exit(if code == std::process::ExitCode::SUCCESS {
            0
        } else {
            1
        });
    }

    // -- GUI mode -----------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([480.0, 320.0])
            .with_title("Doodlepad"),
        ..Default::default()
    };

    eframe::run_native(
        "Doodlepad",
        options,
        Box::new(|cc| Box::new(DoodlepadApp::new(cc))),
    )
}
