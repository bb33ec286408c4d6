//! EGIM downloader window and password prompt.

use chrono::Local;
use eframe::egui;
use egui_extras::DatePickerButton;
use mooda_access::ACOUSTIC_INSTRUMENT;

use super::theme::{form_label, primary_button, section_header, ThemeColors};
use crate::app::MoodaApp;

const LIST_HEIGHT: f32 = 160.0;

impl MoodaApp {
    /// Render the downloader window while it is open.
    pub(crate) fn render_downloader(&mut self, ctx: &egui::Context) {
        if !self.ui_state.show_downloader {
            return;
        }
        let mut open = true;
        egui::Window::new("EMSODEV downloader")
            .open(&mut open)
            .default_size([720.0, 460.0])
            .show(ctx, |ui| {
                let colors = ThemeColors::from_ui(ui);
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(&self.config.api.base_url)
                            .size(11.0)
                            .color(colors.text_muted),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Reload").clicked() {
                            self.download_form.reset();
                            self.downloader.reload();
                        }
                    });
                });
                ui.separator();

                ui.columns(3, |columns| {
                    self.render_observatories(&mut columns[0]);
                    self.render_instruments(&mut columns[1]);
                    self.render_instrument_details(&mut columns[2]);
                });

                ui.separator();
                if self.downloader.selected_instrument() == Some(ACOUSTIC_INSTRUMENT) {
                    self.render_acoustic_form(ui);
                } else {
                    self.render_parameter_form(ui);
                }
            });
        self.ui_state.show_downloader = open;
    }

    fn render_observatories(&mut self, ui: &mut egui::Ui) {
        ui.label(section_header("Observatories"));
        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("observatories")
            .max_height(LIST_HEIGHT)
            .show(ui, |ui| {
                let selected = self.downloader.selected_observatory();
                for observatory in self.downloader.observatories() {
                    let is_selected = selected == Some(observatory.as_str());
                    if ui.selectable_label(is_selected, observatory).clicked() {
                        clicked = Some(observatory.clone());
                    }
                }
            });
        if let Some(observatory) = clicked {
            self.download_form.reset();
            self.downloader.select_observatory(&observatory);
        }
    }

    fn render_instruments(&mut self, ui: &mut egui::Ui) {
        ui.label(section_header("Instruments"));
        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("instruments")
            .max_height(LIST_HEIGHT)
            .show(ui, |ui| {
                let selected = self.downloader.selected_instrument();
                for instrument in self.downloader.instruments() {
                    let is_selected = selected == Some(instrument.name.as_str());
                    if ui
                        .selectable_label(is_selected, instrument.name.as_str())
                        .on_hover_text(instrument.tooltip())
                        .clicked()
                    {
                        clicked = Some(instrument.name.clone());
                    }
                }
            });
        if let Some(instrument) = clicked {
            self.download_form.reset();
            self.downloader.select_instrument(&instrument);
        }
    }

    /// Metadata list for regular instruments, date list for the acoustic one.
    fn render_instrument_details(&mut self, ui: &mut egui::Ui) {
        if self.downloader.selected_instrument() == Some(ACOUSTIC_INSTRUMENT) {
            ui.label(section_header("Dates"));
            let mut clicked = None;
            egui::ScrollArea::vertical()
                .id_salt("acoustic_dates")
                .max_height(LIST_HEIGHT)
                .show(ui, |ui| {
                    let selected = self.downloader.selected_date();
                    for date in self.downloader.dates() {
                        let label = date.acoustic_observation_date.as_str();
                        if ui.selectable_label(selected == Some(label), label).clicked() {
                            clicked = Some(label.to_string());
                        }
                    }
                });
            if let Some(date) = clicked {
                let times = self.downloader.list_times(&date);
                self.download_form.set_times(times);
            }
            return;
        }

        ui.label(section_header("Metadata"));
        egui::ScrollArea::vertical()
            .id_salt("instrument_metadata")
            .max_height(LIST_HEIGHT)
            .show(ui, |ui| {
                for (key, value) in self.downloader.metadata() {
                    ui.label(format!("{key}: {value}"));
                }
            });
    }

    fn render_parameter_form(&mut self, ui: &mut egui::Ui) {
        let parameters = self.downloader.parameters();
        ui.label(section_header("Parameters"));
        if parameters.is_empty() {
            ui.weak("Select an instrument");
        }
        let form = &mut self.download_form;
        egui::ScrollArea::vertical()
            .id_salt("download_parameters")
            .max_height(LIST_HEIGHT)
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for parameter in parameters {
                        let mut checked = form.is_checked(&parameter.name);
                        let response = ui.checkbox(&mut checked, parameter.name.as_str());
                        let response = if parameter.uom.is_empty() {
                            response
                        } else {
                            response.on_hover_text(parameter.uom.as_str())
                        };
                        if response.changed() {
                            form.set_checked(&parameter.name, checked);
                        }
                    }
                });
            });

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.add_enabled_ui(form.uses_date_range(), |ui| {
                ui.label(form_label("From"));
                ui.add(DatePickerButton::new(&mut form.start).id_salt("download_start"));
                ui.label(form_label("To"));
                ui.add(DatePickerButton::new(&mut form.end).id_salt("download_end"));
            });
            ui.separator();
            ui.label(form_label("Get last"));
            ui.add(egui::DragValue::new(&mut form.last).range(0..=1_000_000))
                .on_hover_text("0 downloads the date range");
            ui.label("values");
        });
        form.clamp_dates(Local::now().date_naive());

        let request = form.request(parameters);
        ui.add_space(6.0);
        let enabled = request.is_some() && !self.downloader.is_downloading();
        if ui
            .add_enabled(enabled, primary_button("Download"))
            .on_disabled_hover_text("Check one or more parameters")
            .clicked()
        {
            if let Some(request) = request {
                self.start_download(request);
            }
        }
    }

    fn render_acoustic_form(&mut self, ui: &mut egui::Ui) {
        let form = &mut self.download_form;
        ui.horizontal(|ui| {
            ui.label(form_label("Time"));
            let selected = form.time.clone().unwrap_or_else(|| "-".to_string());
            egui::ComboBox::from_id_salt("acoustic_time")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for time in &form.times {
                        ui.selectable_value(&mut form.time, Some(time.clone()), time.as_str());
                    }
                });
        });

        let request = form.acoustic_request(self.downloader.selected_date());
        ui.add_space(6.0);
        let enabled = request.is_some() && !self.downloader.is_downloading();
        if ui
            .add_enabled(enabled, primary_button("Download"))
            .on_disabled_hover_text("Pick a date and a time")
            .clicked()
        {
            if let Some(request) = request {
                self.start_download(request);
            }
        }
    }

    /// Render the password prompt requested by the downloader.
    pub(crate) fn render_password_prompt(&mut self, ctx: &egui::Context) {
        let Some(password) = self.ui_state.password_prompt.as_mut() else {
            return;
        };
        let mut answer = None;
        egui::Window::new("Password")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!("Password of {}", self.config.api.login));
                let response = ui.add(egui::TextEdit::singleline(password).password(true));
                response.request_focus();
                let entered = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    if ui.add(primary_button("OK")).clicked() || entered {
                        answer = Some(Some(password.clone()));
                    }
                    if ui.button("Cancel").clicked() {
                        answer = Some(None);
                    }
                });
            });
        if let Some(answer) = answer {
            self.ui_state.password_prompt = None;
            self.downloader.provide_password(answer);
        }
    }
}
