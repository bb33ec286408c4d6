//! MOODA GUI application entry point.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod message;
mod state;
mod ui;
mod util;
mod viewer;

use app::MoodaApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::init();
    let config = AppConfig::load();
    let opts = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_maximized(true)
            .with_title(config.window_title.as_str()),
        ..Default::default()
    };
    let title = config.window_title.clone();
    eframe::run_native(
        &title,
        opts,
        Box::new(|cc| {
            ui::theme::configure_style(&cc.egui_ctx);
            Ok(Box::new(MoodaApp::new(config)?))
        }),
    )
}
