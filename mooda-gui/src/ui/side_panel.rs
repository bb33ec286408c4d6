//! Left sidebar: data list, plot modes, graph list and open plots.

use eframe::egui;

use super::theme::{primary_button, section_header};
use crate::app::MoodaApp;
use crate::state::{PlotKind, PlotMode, QC_BAR_NAME};

impl MoodaApp {
    /// Render the parameters sidebar.
    pub(crate) fn render_side_panel(&mut self, ctx: &egui::Context) {
        if !self.ui_state.show_parameters || !self.session.is_loaded() {
            return;
        }
        egui::SidePanel::left("parameters")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_data_list(ui);
                    ui.add_space(8.0);
                    self.render_plot_modes(ui);
                    ui.add_space(8.0);
                    self.render_graph_list(ui);
                    ui.add_space(8.0);
                    self.render_open_plots(ui);
                });
            });
    }

    fn render_data_list(&mut self, ui: &mut egui::Ui) {
        ui.label(section_header("Data"));
        let mut clicked = false;
        for key in self.session.frame.parameters() {
            let selected = self.ui_state.is_selected(&key);
            let mut response = ui.selectable_label(selected, key.as_str());
            if let Some(tooltip) = self.session.parameter_tooltip(&key) {
                response = response.on_hover_text(tooltip);
            }
            if response.clicked() {
                let extend = ui.input(|i| i.modifiers.command || i.modifiers.shift);
                self.ui_state.select_key(&key, extend);
                clicked = true;
            }
        }
        if clicked && self.ui_state.plot_mode.plots_on_click() {
            self.plot_selection();
        }
    }

    fn render_plot_modes(&mut self, ui: &mut egui::Ui) {
        ui.label(section_header("Plot properties"));
        for mode in PlotMode::ALL {
            ui.radio_value(&mut self.ui_state.plot_mode, mode, mode.label());
        }
        ui.add_space(4.0);
        let has_selection = !self.ui_state.selected_keys.is_empty();
        if ui
            .add_enabled(has_selection, primary_button("Plot"))
            .on_disabled_hover_text("Select one or more parameters")
            .clicked()
        {
            self.plot_selection();
        }
    }

    fn render_graph_list(&mut self, ui: &mut egui::Ui) {
        ui.label(section_header("Graphs"));
        for graph in self.session.graphs() {
            if ui.selectable_label(false, graph).clicked() {
                let kind = if graph == QC_BAR_NAME {
                    PlotKind::QcBar
                } else {
                    PlotKind::Spectrogram
                };
                self.session.show_plot(kind);
            }
        }
    }

    fn render_open_plots(&mut self, ui: &mut egui::Ui) {
        if self.session.plots.is_empty() {
            return;
        }
        ui.label(section_header("Open plots"));
        let mut close = None;
        for view in self.session.plots.views_mut() {
            let name = view.name().to_string();
            ui.horizontal(|ui| {
                ui.checkbox(&mut view.visible, name.as_str());
                if ui.small_button("✖").on_hover_text("Close").clicked() {
                    close = Some(name.clone());
                }
            });
        }
        if let Some(name) = close {
            self.session.plots.remove(&name);
        }
    }

    /// Plots the selected parameters in the current mode.
    pub(crate) fn plot_selection(&mut self) {
        match self
            .ui_state
            .plot_mode
            .plot_request(&self.ui_state.selected_keys)
        {
            Some(kind) => self.session.show_plot(kind),
            None => self.session.set_status("Ready"),
        }
    }
}
