//! GUI smoke test

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // Hide console on Windows

use eframe::egui;
use pydoctor::gui::{SmokeApp, WINDOW_TITLE};
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pydoctor=info")),
        )
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_position([100.0, 100.0])
            .with_inner_size([500.0, 400.0])
            .with_min_inner_size([400.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(|cc| Ok(Box::new(SmokeApp::new(cc)))),
    )
}
