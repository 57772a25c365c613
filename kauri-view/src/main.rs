//! Application entry point for the Kauri tree viewer.
//!
//! This binary sets up logging and eframe/egui and delegates all
//! interactive logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use kauri_core::config::SimConfig;
use viewer::Viewer;

/// Starts the native eframe application.
///
/// An optional first argument names a JSON configuration file; without it
/// [`SimConfig::default`] is used. Set `RUST_LOG=debug` to follow growth
/// step by step.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    env_logger::init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => match SimConfig::load(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::error!("cannot load config {path}: {e}");
                std::process::exit(if e.is_config_error() { 2 } else { 1 });
            }
        },
        None => SimConfig::default(),
    };

    let viewer = match Viewer::new(cfg) {
        Ok(v) => v,
        Err(e) => {
            log::error!("cannot start simulation: {e}");
            std::process::exit(if e.is_config_error() { 2 } else { 1 });
        }
    };

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Kauri Tree",
        options,
        Box::new(|_cc| Ok(Box::new(viewer))),
    )
}
