//! Plot view windows.
//!
//! Each visible `PlotView` gets a floating window. Figures come from the
//! session; this module only turns them into egui_plot items.

use std::ops::RangeInclusive;

use eframe::egui::{self, Color32};
use egui_plot::{
    AxisHints, Bar, BarChart, GridMark, HPlacement, Legend, Line, Plot, PlotImage, PlotPoint,
    Points, VLine,
};
use mooda_core::{AverageTime, FlagSeries, Histogram, QcBar, ScatterMatrix, Series, Spectrogram};

use super::theme::form_label;
use crate::app::MoodaApp;
use crate::state::{rescale, value_range, Figure, PlotKind, PlotView};
use crate::util::{f64_to_f32, f64_to_usize_bounded, format_unix_seconds, usize_to_f64};
use crate::viewer::{flag_color, spectrogram_image, Colormap};

const SCATTER_CELL_SIZE: f32 = 150.0;

/// Axis labels for Unix-second x coordinates.
fn time_axis(mark: GridMark, range: &RangeInclusive<f64>) -> String {
    format_unix_seconds(mark.value, range.end() - range.start())
}

/// Hover text for points with Unix-second x coordinates.
fn time_label(name: &str, value: &PlotPoint) -> String {
    let time = format_unix_seconds(value.x, 0.0);
    if name.is_empty() {
        format!("{time}\n{:.3}", value.y)
    } else {
        format!("{name}\n{time}\n{:.3}", value.y)
    }
}

impl MoodaApp {
    /// Render every visible plot view.
    pub(crate) fn render_plot_windows(&mut self, ctx: &egui::Context) {
        let names: Vec<String> = self
            .session
            .plots
            .views()
            .iter()
            .filter(|v| v.visible)
            .map(|v| v.name().to_string())
            .collect();

        let mut refresh = Vec::new();
        for name in names {
            let Some(view) = self.session.plots.get_mut(&name) else {
                continue;
            };
            let texture = &mut self.spectrogram_texture;
            let colormap = &mut self.ui_state.colormap;
            let mut open = true;
            egui::Window::new(name.as_str())
                .id(egui::Id::new(("plot_window", name.as_str())))
                .open(&mut open)
                .default_size([560.0, 360.0])
                .show(ctx, |ui| {
                    if draw_view(ui, view, texture, colormap) {
                        refresh.push(name.clone());
                    }
                });
            view.visible = open;
        }

        for name in refresh {
            self.session.set_status("Making the figure");
            self.session.refresh_plot(&name);
            if !self.session.status().starts_with("Error") {
                self.session.set_status("Ready");
            }
        }
    }
}

/// Draws one view. Returns true when its toolbar asked for a re-render.
fn draw_view(
    ui: &mut egui::Ui,
    view: &mut PlotView,
    texture: &mut Option<egui::TextureHandle>,
    colormap: &mut Colormap,
) -> bool {
    let id = view.name().to_string();
    let mut apply = false;
    if let PlotKind::TimeSeries { keys } = view.kind().clone() {
        apply = time_series_toolbar(ui, &id, &keys, view);
    }
    match view.figure() {
        Figure::TimeSeries(series) => {
            draw_time_series(ui, &id, series, view.options.secondary.as_deref());
        }
        Figure::Histogram(histograms) => draw_histograms(ui, &id, histograms),
        Figure::Flags(flags) => draw_flags(ui, &id, flags),
        Figure::QcBar(bars) => draw_qc_bars(ui, &id, bars),
        Figure::ScatterMatrix(matrix) => draw_scatter_matrix(ui, &id, matrix),
        Figure::Spectrogram(spectrogram) => {
            draw_spectrogram(ui, &id, spectrogram, texture, colormap);
        }
    }
    apply
}

fn time_series_toolbar(ui: &mut egui::Ui, id: &str, keys: &[String], view: &mut PlotView) -> bool {
    let options = &mut view.options;
    let mut apply = false;
    ui.horizontal(|ui| {
        ui.label(form_label("Moving window"));
        ui.add(egui::DragValue::new(&mut options.rolling).range(0..=100_000))
            .on_hover_text("Points per moving average, 0 for none");

        ui.label(form_label("Average time"));
        egui::ComboBox::from_id_salt((id, "average"))
            .selected_text(options.average.to_string())
            .show_ui(ui, |ui| {
                for average in AverageTime::ALL {
                    ui.selectable_value(&mut options.average, average, average.to_string());
                }
            });

        if keys.len() > 1 {
            ui.label(form_label("Right axis"));
            let selected = options.secondary.clone().unwrap_or_else(|| "None".to_string());
            egui::ComboBox::from_id_salt((id, "secondary"))
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut options.secondary, None, "None");
                    for key in keys {
                        ui.selectable_value(&mut options.secondary, Some(key.clone()), key);
                    }
                });
        }

        apply = ui.button("Apply").clicked();
    });
    apply
}

fn draw_time_series(ui: &mut egui::Ui, id: &str, series: &[Series], secondary: Option<&str>) {
    let right = secondary.and_then(|key| series.iter().find(|s| s.key == key));
    let primary_range = series
        .iter()
        .filter(|s| Some(s.key.as_str()) != secondary)
        .filter_map(|s| value_range(&s.points))
        .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)));
    let mapping = match (right, primary_range) {
        (Some(s), Some(to)) => value_range(&s.points).map(|from| (from, to)),
        _ => None,
    };

    let mut plot = Plot::new(id)
        .legend(Legend::default())
        .x_axis_formatter(time_axis)
        .label_formatter(time_label);
    if let Some((from, to)) = mapping {
        let label = format!("{} (right)", secondary.unwrap_or_default());
        let to_span = to.1 - to.0;
        plot = plot.custom_y_axes(vec![
            AxisHints::new_y().placement(HPlacement::Left),
            AxisHints::new_y()
                .label(label)
                .placement(HPlacement::Right)
                .formatter(move |mark, _range| {
                    let t = if to_span.abs() > f64::EPSILON {
                        (mark.value - to.0) / to_span
                    } else {
                        0.5
                    };
                    format!("{:.2}", from.0 + t * (from.1 - from.0))
                }),
        ]);
    }

    plot.show(ui, |plot_ui| {
        for s in series {
            match mapping {
                Some((from, to)) if Some(s.key.as_str()) == secondary => {
                    plot_ui.line(
                        Line::new(rescale(&s.points, from, to)).name(format!("{} (right)", s.key)),
                    );
                }
                _ => plot_ui.line(Line::new(s.points.clone()).name(&s.key)),
            }
        }
    });
}

fn draw_histograms(ui: &mut egui::Ui, id: &str, histograms: &[Histogram]) {
    Plot::new(id)
        .legend(Legend::default())
        .y_axis_label("Count")
        .include_y(0.0)
        .show(ui, |plot_ui| {
            for histogram in histograms {
                let bars: Vec<Bar> = histogram
                    .counts
                    .iter()
                    .enumerate()
                    .map(|(i, &count)| {
                        let x = histogram.start + (usize_to_f64(i) + 0.5) * histogram.bin_width;
                        Bar::new(x, usize_to_f64(count)).width(histogram.bin_width)
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).name(&histogram.key));
                if histogram.mean.is_finite() {
                    plot_ui.vline(
                        VLine::new(histogram.mean)
                            .color(Color32::RED)
                            .name(format!("mean {}", histogram.key)),
                    );
                }
            }
        });
}

fn draw_flags(ui: &mut egui::Ui, id: &str, flags: &FlagSeries) {
    Plot::new(id)
        .legend(Legend::default())
        .x_axis_formatter(time_axis)
        .label_formatter(time_label)
        .show(ui, |plot_ui| {
            for (flag, points) in &flags.groups {
                plot_ui.points(
                    Points::new(points.clone())
                        .radius(2.0)
                        .color(flag_color(*flag))
                        .name(format!("Flag {flag}")),
                );
            }
        });
}

fn draw_qc_bars(ui: &mut egui::Ui, id: &str, bars: &[QcBar]) {
    if bars.is_empty() {
        ui.label("No QC flags");
        return;
    }
    let names: Vec<String> = bars.iter().map(|b| b.parameter.clone()).collect();
    let mut charts: Vec<BarChart> = Vec::new();
    for flag in 0..10 {
        let heights: Vec<Bar> = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| Bar::new(usize_to_f64(i), usize_to_f64(bar.counts[flag])).width(0.6))
            .collect();
        if heights.iter().all(|b| b.value == 0.0) {
            continue;
        }
        let Ok(value) = u8::try_from(flag) else {
            continue;
        };
        let color = mooda_core::QcFlag::new(value).map_or(Color32::GRAY, flag_color);
        let others: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(heights)
            .color(color)
            .name(format!("Flag {flag}"))
            .stack_on(&others);
        charts.push(chart);
    }

    Plot::new(id)
        .legend(Legend::default())
        .y_axis_label("Observations")
        .include_y(0.0)
        .x_axis_formatter(move |mark, _range| {
            if mark.value.fract().abs() > 1e-6 {
                return String::new();
            }
            f64_to_usize_bounded(mark.value, names.len())
                .map(|i| names[i].clone())
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

fn draw_scatter_matrix(ui: &mut egui::Ui, id: &str, matrix: &ScatterMatrix) {
    egui::ScrollArea::both().show(ui, |ui| {
        egui::Grid::new((id, "scatter_grid")).show(ui, |ui| {
            ui.label("");
            for key in &matrix.keys {
                ui.label(form_label(key));
            }
            ui.end_row();

            for y_key in &matrix.keys {
                ui.label(form_label(y_key));
                for x_key in &matrix.keys {
                    let cell_id = format!("{id}_{x_key}_{y_key}");
                    let plot = Plot::new(cell_id)
                        .width(SCATTER_CELL_SIZE)
                        .height(SCATTER_CELL_SIZE)
                        .show_axes(false)
                        .allow_drag(false)
                        .allow_zoom(false)
                        .allow_scroll(false);
                    if x_key == y_key {
                        let histogram = matrix.diagonal.iter().find(|h| &h.key == x_key);
                        plot.show(ui, |plot_ui| {
                            if let Some(histogram) = histogram {
                                let bars: Vec<Bar> = histogram
                                    .counts
                                    .iter()
                                    .enumerate()
                                    .map(|(i, &count)| {
                                        let x = histogram.start
                                            + (usize_to_f64(i) + 0.5) * histogram.bin_width;
                                        Bar::new(x, usize_to_f64(count)).width(histogram.bin_width)
                                    })
                                    .collect();
                                plot_ui.bar_chart(BarChart::new(bars));
                            }
                        });
                    } else {
                        let points = matrix
                            .cell(x_key, y_key)
                            .map(|c| c.points.clone())
                            .unwrap_or_default();
                        plot.show(ui, |plot_ui| {
                            plot_ui.points(Points::new(points).radius(1.5));
                        });
                    }
                }
                ui.end_row();
            }
        });
    });
}

fn draw_spectrogram(
    ui: &mut egui::Ui,
    id: &str,
    spectrogram: &Spectrogram,
    texture: &mut Option<egui::TextureHandle>,
    colormap: &mut Colormap,
) {
    ui.horizontal(|ui| {
        ui.label(form_label("Colormap"));
        egui::ComboBox::from_id_salt((id, "colormap"))
            .selected_text(colormap.to_string())
            .show_ui(ui, |ui| {
                for cmap in Colormap::ALL {
                    if ui
                        .selectable_value(colormap, cmap, cmap.to_string())
                        .clicked()
                    {
                        *texture = None;
                    }
                }
            });
    });

    let (Some(&t0), Some(&t1)) = (spectrogram.times.first(), spectrogram.times.last()) else {
        ui.label("No Data");
        return;
    };
    let (Some(&f0), Some(&f1)) = (
        spectrogram.frequencies.first(),
        spectrogram.frequencies.last(),
    ) else {
        ui.label("No Data");
        return;
    };

    let handle = texture.get_or_insert_with(|| {
        ui.ctx().load_texture(
            "spectrogram",
            spectrogram_image(spectrogram, *colormap),
            egui::TextureOptions::NEAREST,
        )
    });
    let width = (t1 - t0).max(1.0);
    let height = (f1 - f0).max(1.0);
    let center = PlotPoint::new(t0 + width / 2.0, f0 + height / 2.0);
    let size = egui::vec2(f64_to_f32(width), f64_to_f32(height));

    Plot::new(id)
        .x_axis_formatter(time_axis)
        .y_axis_label("Frequency (Hz)")
        .show(ui, |plot_ui| {
            plot_ui.image(PlotImage::new(handle.id(), center, size));
        });
}
