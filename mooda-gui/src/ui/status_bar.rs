//! Bottom status bar.

use eframe::egui;

use super::theme::{accent, ThemeColors};
use crate::app::MoodaApp;
use crate::util::format_number;

impl MoodaApp {
    /// Render the status line with a busy indicator.
    pub(crate) fn render_bottom_panel(&self, ctx: &egui::Context) {
        let colors = ThemeColors::from_ctx(ctx);
        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                egui::Frame::none()
                    .fill(colors.bg_header)
                    .stroke(egui::Stroke::new(1.0, colors.border))
                    .inner_margin(egui::Margin::symmetric(12.0, 4.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let status = self.session.status();
                    let busy = self.ui_state.is_loading || self.downloader.is_downloading();
                    let color = if self.downloader.is_awaiting_password() {
                        accent::ORANGE
                    } else if busy {
                        accent::BLUE
                    } else if status.starts_with("Error") {
                        accent::RED
                    } else {
                        accent::GREEN
                    };
                    ui.label(egui::RichText::new("●").size(11.0).color(color));
                    ui.label(egui::RichText::new(status).size(11.0));
                    if busy {
                        ui.spinner();
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if self.session.is_loaded() {
                            let text = format!(
                                "{} rows | {} parameters",
                                format_number(self.session.frame.len()),
                                self.session.frame.parameters().len()
                            );
                            ui.label(
                                egui::RichText::new(text)
                                    .size(11.0)
                                    .color(colors.text_muted),
                            );
                        }
                    });
                });
            });
    }
}
