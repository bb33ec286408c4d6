//! Main view: metadata area and datalog.

use eframe::egui;

use super::theme::{form_label, section_header};
use crate::app::MoodaApp;

impl MoodaApp {
    /// Render the datalog pane and the central metadata area.
    pub(crate) fn render_central_panel(&mut self, ctx: &egui::Context) {
        if self.ui_state.show_datalog {
            egui::TopBottomPanel::bottom("datalog")
                .resizable(true)
                .default_height(160.0)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(section_header("Datalog"));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("Hide").clicked() {
                                self.ui_state.show_datalog = false;
                            }
                        });
                    });
                    egui::ScrollArea::vertical()
                        .stick_to_bottom(true)
                        .auto_shrink([false, false])
                        .show(ui, |ui| {
                            for line in self.session.datalog.lines() {
                                ui.monospace(line);
                            }
                        });
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.session.is_loaded() {
                ui.centered_and_justified(|ui| {
                    ui.label(if self.ui_state.is_loading {
                        "Opening data..."
                    } else {
                        "No Data"
                    });
                });
                return;
            }
            if self.ui_state.show_metadata {
                self.render_metadata(ui);
            }
        });
    }

    fn render_metadata(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(section_header("Metadata"));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("Hide").clicked() {
                    self.ui_state.show_metadata = false;
                }
                if ui.small_button("Copy").clicked() {
                    ui.ctx().copy_text(self.session.metadata_text());
                }
            });
        });
        egui::ScrollArea::vertical()
            .auto_shrink([false, true])
            .show(ui, |ui| {
                egui::Grid::new("metadata_grid")
                    .num_columns(2)
                    .striped(true)
                    .spacing([16.0, 4.0])
                    .show(ui, |ui| {
                        for (key, value) in &self.session.frame.metadata {
                            ui.label(egui::RichText::new(key).strong());
                            ui.label(value.to_string());
                            ui.end_row();
                        }
                    });
                ui.add_space(10.0);
                ui.label(form_label("Other information"));
                ui.monospace(self.session.frame.to_string());
            });
    }
}
