//! Menu bar and keyboard shortcuts.

use eframe::egui::{self, Key, KeyboardShortcut, Modifiers};

use crate::app::MoodaApp;

const NEW_PROJECT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::N);
const OPEN: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::O);
const SAVE: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::S);
const EXIT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Q);
const DATALOG: KeyboardShortcut = KeyboardShortcut::new(Modifiers::NONE, Key::F1);
const METADATA: KeyboardShortcut = KeyboardShortcut::new(Modifiers::NONE, Key::F2);
const PARAMETERS: KeyboardShortcut = KeyboardShortcut::new(Modifiers::NONE, Key::F3);

/// A menu entry with its shortcut hint.
fn entry(ctx: &egui::Context, text: &str, shortcut: &KeyboardShortcut) -> egui::Button<'static> {
    egui::Button::new(text.to_string()).shortcut_text(ctx.format_shortcut(shortcut))
}

impl MoodaApp {
    /// Handle the global shortcuts. Disabled actions ignore their keys.
    pub(crate) fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let loaded = self.session.is_loaded();
        let pressed = |shortcut: &KeyboardShortcut| ctx.input_mut(|i| i.consume_shortcut(shortcut));

        if pressed(&NEW_PROJECT) {
            self.new_project();
        }
        if pressed(&OPEN) {
            self.open_dialog(false);
        }
        if pressed(&SAVE) && loaded {
            self.save_as();
        }
        if pressed(&EXIT) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        if pressed(&DATALOG) {
            self.ui_state.show_datalog = !self.ui_state.show_datalog;
        }
        if pressed(&METADATA) && loaded {
            self.ui_state.show_metadata = !self.ui_state.show_metadata;
        }
        if pressed(&PARAMETERS) && loaded {
            self.ui_state.show_parameters = !self.ui_state.show_parameters;
        }
    }

    /// Render the File, Data and View menus.
    pub(crate) fn render_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                self.render_file_menu(ui, ctx);
                self.render_data_menu(ui);
                self.render_view_menu(ui, ctx);
            });
        });
    }

    fn render_file_menu(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let loaded = self.session.is_loaded();
        ui.menu_button("File", |ui| {
            if ui.add(entry(ctx, "New project", &NEW_PROJECT)).clicked() {
                self.new_project();
                ui.close_menu();
            }
            if ui.add(entry(ctx, "Open", &OPEN)).clicked() {
                ui.close_menu();
                self.open_dialog(false);
            }
            if ui
                .button("Add")
                .on_hover_text("Open a file and append it to the current data")
                .clicked()
            {
                ui.close_menu();
                self.open_dialog(true);
            }
            if ui.button("EGIM downloader").clicked() {
                ui.close_menu();
                self.open_downloader();
            }
            ui.separator();
            if ui.add_enabled(loaded, entry(ctx, "Save as", &SAVE)).clicked() {
                ui.close_menu();
                self.save_as();
            }
            ui.separator();
            if ui.add(entry(ctx, "Exit", &EXIT)).clicked() {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });
    }

    fn render_data_menu(&mut self, ui: &mut egui::Ui) {
        let loaded = self.session.is_loaded();
        ui.add_enabled_ui(loaded, |ui| {
            ui.menu_button("Data", |ui| {
                ui.menu_button("QC", |ui| {
                    if ui
                        .button("Auto")
                        .on_hover_text("Apply the current QC preferences")
                        .clicked()
                    {
                        ui.close_menu();
                        let request = self.session.panels.qc.confirm();
                        self.submit_panel(request);
                    }
                    if ui.button("Preferences").clicked() {
                        ui.close_menu();
                        self.session.panels.qc.open = true;
                    }
                });
                let panels = &mut self.session.panels;
                for (label, open) in [
                    ("Remove parameters", &mut panels.drop.open),
                    ("Rename parameters", &mut panels.rename.open),
                    ("Resample data", &mut panels.resample.open),
                    ("Slice data", &mut panels.slice.open),
                ] {
                    if ui.button(label).clicked() {
                        *open = true;
                        ui.close_menu();
                    }
                }
            });
        });
    }

    fn render_view_menu(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let loaded = self.session.is_loaded();
        ui.menu_button("View", |ui| {
            if ui
                .add(
                    egui::Button::new("Datalog")
                        .selected(self.ui_state.show_datalog)
                        .shortcut_text(ctx.format_shortcut(&DATALOG)),
                )
                .clicked()
            {
                self.ui_state.show_datalog = !self.ui_state.show_datalog;
                ui.close_menu();
            }
            for (label, shortcut, visible) in [
                ("Metadata", &METADATA, &mut self.ui_state.show_metadata),
                ("Parameters", &PARAMETERS, &mut self.ui_state.show_parameters),
            ] {
                let button = egui::Button::new(label)
                    .selected(*visible)
                    .shortcut_text(ctx.format_shortcut(shortcut));
                if ui.add_enabled(loaded, button).clicked() {
                    *visible = !*visible;
                    ui.close_menu();
                }
            }
        });
    }
}
