//! Selector panel windows: drop, QC, rename, resample and slice.

use eframe::egui;
use mooda_core::QcFlag;

use super::theme::{form_label, primary_button};
use crate::app::MoodaApp;
use crate::state::{
    flag_choices, DropMode, DropOptions, PanelError, PanelOptions, PanelRequest, QcOptions,
    RenameOptions, ResampleOptions, SelectorPanel, Selection, SliceOptions,
};

impl MoodaApp {
    /// Applies a confirmed panel, or reports why it could not be confirmed.
    pub(crate) fn submit_panel(&mut self, request: Result<PanelRequest, PanelError>) {
        match request {
            Ok(request) => {
                log::debug!("Applying {request:?}");
                self.session.apply(request);
                self.dataset_changed();
            }
            Err(e) => self.session.set_status(e.to_string()),
        }
    }

    /// Render the open selector panels.
    pub(crate) fn render_panel_windows(&mut self, ctx: &egui::Context) {
        let panels = &mut self.session.panels;
        let requests = [
            show_panel(ctx, "Remove parameters", &mut panels.drop, drop_body),
            show_panel(ctx, "QC preferences", &mut panels.qc, qc_body),
            show_panel(ctx, "Rename parameters", &mut panels.rename, rename_body),
            show_panel(ctx, "Resample data", &mut panels.resample, resample_body),
            show_panel(ctx, "Slice data", &mut panels.slice, slice_body),
        ];
        for request in requests.into_iter().flatten() {
            self.submit_panel(request);
        }
    }
}

/// Shows one panel window. `body` draws the panel and returns true when
/// its confirm button was clicked. A successful confirmation closes the
/// window.
fn show_panel<O: PanelOptions>(
    ctx: &egui::Context,
    title: &str,
    panel: &mut SelectorPanel<O>,
    body: fn(&mut egui::Ui, &mut SelectorPanel<O>) -> bool,
) -> Option<Result<PanelRequest, PanelError>> {
    if !panel.open {
        return None;
    }
    let mut open = true;
    let confirmed = egui::Window::new(title)
        .open(&mut open)
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| body(ui, panel))
        .and_then(|response| response.inner)
        .unwrap_or(false);
    panel.open = open;
    if !confirmed {
        return None;
    }
    let request = panel.confirm();
    if request.is_ok() {
        panel.open = false;
    }
    Some(request)
}

/// The checkable list of a panel.
fn checklist<O>(ui: &mut egui::Ui, id: &str, panel: &mut SelectorPanel<O>) {
    if panel.items().is_empty() {
        ui.weak("No parameters");
        return;
    }
    let items = panel.items().to_vec();
    egui::ScrollArea::vertical()
        .id_salt(id)
        .max_height(220.0)
        .show(ui, |ui| {
            for item in &items {
                let checked = panel.is_checked(item);
                match panel.selection() {
                    Selection::Single => {
                        if ui.radio(checked, item.as_str()).clicked() {
                            panel.set_checked(item, true);
                        }
                    }
                    Selection::Multiple => {
                        let mut value = checked;
                        if ui.checkbox(&mut value, item.as_str()).changed() {
                            panel.set_checked(item, value);
                        }
                    }
                }
            }
        });
}

fn select_buttons<O>(ui: &mut egui::Ui, panel: &mut SelectorPanel<O>) {
    ui.horizontal(|ui| {
        if ui.small_button("Select all").clicked() {
            panel.set_all(true);
        }
        if ui.small_button("Clear").clicked() {
            panel.set_all(false);
        }
    });
}

fn drop_body(ui: &mut egui::Ui, panel: &mut SelectorPanel<DropOptions>) -> bool {
    ui.label(form_label("Parameters"));
    checklist(ui, "drop_list", panel);
    select_buttons(ui, panel);
    ui.separator();

    let options = &mut panel.options;
    ui.radio_value(&mut options.mode, DropMode::All, "All");
    ui.radio_value(
        &mut options.mode,
        DropMode::GoodOnly,
        "Use QC Flags = 0 and 1",
    );
    ui.add_enabled(
        options.mode == DropMode::GoodOnly,
        egui::Checkbox::new(&mut options.dropnan, "Drop NaN"),
    );
    ui.add_space(6.0);
    ui.add(primary_button("Delete")).clicked()
}

fn flag_text(flag: Option<QcFlag>) -> String {
    flag.map_or_else(|| "Skip".to_string(), |f| f.to_string())
}

fn flag_combo(ui: &mut egui::Ui, label: &str, value: &mut Option<QcFlag>) {
    ui.label(label);
    egui::ComboBox::from_id_salt(label)
        .selected_text(flag_text(*value))
        .show_ui(ui, |ui| {
            for choice in flag_choices() {
                ui.selectable_value(value, choice, flag_text(choice));
            }
        });
    ui.end_row();
}

fn qc_body(ui: &mut egui::Ui, panel: &mut SelectorPanel<QcOptions>) -> bool {
    ui.checkbox(&mut panel.options.all, "All parameters");
    let all = panel.options.all;
    ui.add_enabled_ui(!all, |ui| {
        checklist(ui, "qc_list", panel);
        select_buttons(ui, panel);
    });
    ui.separator();

    let settings = &mut panel.options.settings;
    egui::Grid::new("qc_settings")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            flag_combo(ui, "Reset flags to", &mut settings.reset);
            flag_combo(ui, "Spike test flag", &mut settings.spike);
            flag_combo(ui, "Range test flag", &mut settings.range);
            flag_combo(ui, "Flat test flag", &mut settings.flat);

            ui.label("Spike threshold");
            ui.add(
                egui::DragValue::new(&mut settings.threshold)
                    .range(0.0..=f64::MAX)
                    .speed(0.1),
            );
            ui.end_row();

            ui.label("Rolling window")
                .on_hover_text("Number of values, 0 for automatic");
            ui.add(egui::DragValue::new(&mut settings.window).range(0..=10_000));
            ui.end_row();

            let mut translate = settings.flag2flag.is_some();
            ui.checkbox(&mut translate, "Change flag");
            let (mut from, mut to) = settings
                .flag2flag
                .unwrap_or((QcFlag::NO_QC, QcFlag::GOOD));
            ui.add_enabled_ui(translate, |ui| {
                ui.horizontal(|ui| {
                    flag_value_combo(ui, "flag_from", &mut from);
                    ui.label("to");
                    flag_value_combo(ui, "flag_to", &mut to);
                });
            });
            settings.flag2flag = translate.then_some((from, to));
            ui.end_row();
        });

    ui.add_space(6.0);
    ui.add(primary_button("Apply")).clicked()
}

fn flag_value_combo(ui: &mut egui::Ui, id: &str, value: &mut QcFlag) {
    egui::ComboBox::from_id_salt(id)
        .width(48.0)
        .selected_text(value.to_string())
        .show_ui(ui, |ui| {
            for choice in flag_choices().into_iter().flatten() {
                ui.selectable_value(value, choice, choice.to_string());
            }
        });
}

fn rename_body(ui: &mut egui::Ui, panel: &mut SelectorPanel<RenameOptions>) -> bool {
    ui.label(form_label("Parameter"));
    checklist(ui, "rename_list", panel);
    ui.separator();
    ui.label(form_label("New name"));
    let response = ui.text_edit_singleline(&mut panel.options.new_name);
    let entered = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
    ui.add_space(6.0);
    ui.add(primary_button("Rename")).clicked() || entered
}

fn resample_body(ui: &mut egui::Ui, panel: &mut SelectorPanel<ResampleOptions>) -> bool {
    ui.label(form_label("Rule"));
    checklist(ui, "resample_list", panel);
    ui.add_space(6.0);
    ui.add(primary_button("Apply")).clicked()
}

fn slice_body(ui: &mut egui::Ui, panel: &mut SelectorPanel<SliceOptions>) -> bool {
    let options = &mut panel.options;
    egui::Grid::new("slice_times")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Start");
            ui.text_edit_singleline(&mut options.start);
            ui.end_row();
            ui.label("End");
            ui.text_edit_singleline(&mut options.end);
            ui.end_row();
        });
    ui.weak("YYYY-MM-DD hh:mm:ss");
    ui.add_space(6.0);
    ui.add(primary_button("Slice")).clicked()
}
