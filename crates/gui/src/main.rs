mod app;
pub mod i18n;
mod loader;
mod ui;
mod viewport;

// Settings live in the library so the headless harness can build sessions
// from them too.
pub use blockmatch_lib::state;

use std::path::PathBuf;

use app::MatchApp;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blockmatch=info,blockmatch_lib=info".into()),
        )
        .init();

    // Parse --exercise <path> argument
    let initial_exercise = parse_exercise_arg();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("blockmatch")
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "blockmatch",
        native_options,
        Box::new(move |cc| Ok(Box::new(MatchApp::new(cc, initial_exercise)))),
    ) {
        tracing::error!("Failed to start application: {e}");
    }
}

fn parse_exercise_arg() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--exercise" && i + 1 < args.len() {
            let path = PathBuf::from(&args[i + 1]);
            if path.is_file() {
                return Some(path);
            }
            tracing::error!("Exercise file not found: {}", path.display());
            break;
        }
        i += 1;
    }
    None
}
