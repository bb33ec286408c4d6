//! Session state: the loaded dataset and everything that depends on it.
//!
//! All dataset mutations go through `Session` on the UI thread. Each one
//! mutates the frame in place, re-lists the selector panels, reconciles
//! the plot views and reports a status line plus a datalog entry.

use std::path::Path;

use chrono::{Local, NaiveDateTime};
use mooda_core::{
    QcFlag, QcSettings, ResampleRule, WaterFrame, GOOD_FLAGS, QC_SUFFIX,
};

use crate::state::panels::Panels;
use crate::state::plots::{PlotKind, PlotRegistry, QC_BAR_NAME, SPECTROGRAM_NAME};

/// Mutation requested by a selector panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelRequest {
    /// `flags = None` or an empty list removes the parameters; any other
    /// flag list keeps only the observations flagged 0 or 1.
    Drop {
        keys: Vec<String>,
        flags: Option<Vec<QcFlag>>,
        dropnan: bool,
    },
    Rename {
        old: String,
        new: String,
    },
    Resample(ResampleRule),
    Slice {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// `parameters = None` tests every parameter.
    Qc {
        parameters: Option<Vec<String>>,
        settings: QcSettings,
    },
}

/// Append-only log shown in the datalog pane.
#[derive(Debug, Clone)]
pub struct Datalog {
    lines: Vec<String>,
}

impl Default for Datalog {
    fn default() -> Self {
        Self {
            lines: vec![Local::now().format("%Y-%m-%d %H:%M:%S").to_string()],
        }
    }
}

impl Datalog {
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }
}

/// The loaded dataset with its panels, views and logs.
#[derive(Debug)]
pub struct Session {
    pub frame: WaterFrame,
    pub plots: PlotRegistry,
    pub panels: Panels,
    pub datalog: Datalog,
    status: String,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            frame: WaterFrame::new(),
            plots: PlotRegistry::default(),
            panels: Panels::default(),
            datalog: Datalog::default(),
            status: "Ready".to_string(),
        }
    }
}

impl Session {
    /// Status bar text.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = text.into();
        log::debug!("Status: {}", self.status);
    }

    /// Appends to the datalog.
    pub fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::info!("{line}");
        self.datalog.push(line);
    }

    /// Sets the status and logs the same text.
    pub fn report(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.log(text.clone());
        self.set_status(text);
    }

    fn report_error(&mut self, text: String) {
        log::warn!("{text}");
        self.datalog.push(text.clone());
        self.set_status(text);
    }

    /// True once a dataset is loaded; gates the Data menu and saving.
    pub fn is_loaded(&self) -> bool {
        !self.frame.is_empty()
    }

    /// Discards the dataset and every view.
    pub fn new_project(&mut self) {
        self.frame = WaterFrame::new();
        self.plots.clear();
        self.panels.close_all();
        self.panels.refresh(&self.frame);
        self.log("New project");
        self.set_status("Ready");
    }

    /// Installs a frame read from `path`, replacing the dataset or
    /// appending to it.
    pub fn load(&mut self, frame: WaterFrame, path: &Path, append: bool) {
        self.set_status("Opening data");
        if !append {
            self.new_project();
        }
        self.frame.concat(frame);
        self.log(format!("Working with file {}", path.display()));
        self.dataset_changed();
        self.set_status("Ready");
    }

    /// Merges a downloaded fragment. Returns false for empty fragments.
    ///
    /// Acoustic recordings are never combined: if the dataset already holds
    /// acoustic data it is cleared first.
    pub fn merge(&mut self, fragment: WaterFrame) -> bool {
        if fragment.len() == 0 {
            return false;
        }
        if self.frame.has_acoustic_data() {
            self.frame.clear();
        }
        self.frame.concat(fragment);
        self.dataset_changed();
        true
    }

    fn dataset_changed(&mut self) {
        self.log_metadata();
        self.log_parameters();
        self.panels.refresh(&self.frame);
        self.refresh_plots();
        if let Err(e) = self.plots.show(PlotKind::QcBar, &self.frame) {
            log::warn!("QC plot not created: {e}");
        }
    }

    fn log_metadata(&mut self) {
        let mut text = String::from("Metadata:");
        for (key, value) in &self.frame.metadata {
            text.push_str(&format!("\n- {key}: {value}"));
        }
        self.log(text);
    }

    fn log_parameters(&mut self) {
        let mut text = String::from("Data:");
        for parameter in self.frame.parameters() {
            if let Some(tooltip) = self.parameter_tooltip(&parameter) {
                text.push_str(&format!("\n- {parameter}: {tooltip}"));
            }
        }
        self.log(text);
    }

    /// `long_name (units)` of a parameter, if known.
    pub fn parameter_tooltip(&self, parameter: &str) -> Option<String> {
        self.frame
            .meaning
            .get(parameter)
            .map(|m| format!("{} ({})", m.long_name, m.units))
    }

    /// `key: value` lines of the metadata area.
    pub fn metadata_text(&self) -> String {
        self.frame
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Entries of the graph list.
    pub fn graphs(&self) -> Vec<&'static str> {
        let mut graphs = vec![QC_BAR_NAME];
        if self.frame.has_acoustic_data() {
            graphs.push(SPECTROGRAM_NAME);
        }
        graphs
    }

    /// Opens (or re-shows) a plot view.
    pub fn show_plot(&mut self, kind: PlotKind) {
        self.set_status("Making the figure");
        match self.plots.show(kind, &self.frame) {
            Ok(()) => self.set_status("Ready"),
            Err(e) => self.report_error(format!("Error making the figure: {e}")),
        }
    }

    /// Re-renders a single view, e.g. after its toolbar changed.
    pub fn refresh_plot(&mut self, name: &str) {
        let Some(view) = self.plots.get_mut(name) else {
            return;
        };
        if let Err(e) = view.refresh(&self.frame) {
            if crate::state::plots::is_stale(&e) {
                self.plots.remove(name);
            }
            self.report_error(format!("Error refreshing {name}: {e}"));
        }
    }

    /// Re-renders every view, closing the stale ones.
    pub fn refresh_plots(&mut self) {
        for name in self.plots.refresh_all(&self.frame) {
            self.log(format!("Plot {name} closed"));
        }
    }

    /// Applies a panel request.
    pub fn apply(&mut self, request: PanelRequest) {
        match request {
            PanelRequest::Drop {
                keys,
                flags,
                dropnan,
            } => self.drop_data(&keys, flags.as_deref(), dropnan),
            PanelRequest::Rename { old, new } => self.rename(&old, &new),
            PanelRequest::Resample(rule) => self.resample(rule),
            PanelRequest::Slice { start, end } => self.slice(start, end),
            PanelRequest::Qc {
                parameters,
                settings,
            } => self.apply_qc(parameters.as_deref(), &settings),
        }
    }

    fn drop_data(&mut self, keys: &[String], flags: Option<&[QcFlag]>, dropnan: bool) {
        self.log("Deleting data");
        let flags = flags.filter(|f| !f.is_empty());
        let result = match flags {
            None => self.frame.drop(keys),
            Some(_) => self.frame.use_only(keys, &GOOD_FLAGS, dropnan),
        };
        if let Err(e) = result {
            self.report_error(format!("Error deleting data: {e}"));
            return;
        }
        self.panels.refresh(&self.frame);
        self.refresh_plots();

        let names: String = keys
            .iter()
            .filter(|k| !k.ends_with(QC_SUFFIX))
            .map(|k| format!("{k}, "))
            .collect();
        let message = match flags {
            None => {
                let names: String = keys
                    .iter()
                    .filter(|k| !k.ends_with(QC_SUFFIX))
                    .map(|k| format!("{k} "))
                    .collect();
                format!("{names}deleted")
            }
            Some(flags) => {
                let flags: String = flags.iter().map(|f| format!("{f}, ")).collect();
                format!("Data with QC Flags {flags}from {names}deleted")
            }
        };
        self.report(message);
    }

    fn rename(&mut self, old: &str, new: &str) {
        self.set_status(format!("Changing name {old} to {new}"));
        if let Err(e) = self.frame.rename(old, new) {
            self.report_error(format!("Error renaming {old}: {e}"));
            return;
        }
        for name in self.plots.rename_key(old, new, &self.frame) {
            self.log(format!("Plot {name} closed"));
        }
        self.panels.refresh(&self.frame);
        self.set_status("Ready");
        self.log(format!("Key name {old} changed to {new}."));
    }

    fn resample(&mut self, rule: ResampleRule) {
        self.set_status("Resampling data");
        self.frame.resample(rule);
        self.panels.refresh(&self.frame);
        self.refresh_plots();
        self.set_status("Ready");
        self.log(format!("Dataframe resampled with rule {}.", rule.label()));
    }

    fn slice(&mut self, start: NaiveDateTime, end: NaiveDateTime) {
        self.set_status("Slicing data");
        if let Err(e) = self.frame.slice_time(start, end) {
            self.report_error(format!("Error slicing data: {e}"));
            return;
        }
        self.panels.refresh(&self.frame);
        self.refresh_plots();
        self.set_status("Ready");
        self.log(format!("Dataframe sliced from {start} to {end}."));
    }

    fn apply_qc(&mut self, parameters: Option<&[String]>, settings: &QcSettings) {
        self.set_status("Creating QC flags");
        let mut final_status = "Ready".to_string();
        match self.frame.apply_qc(parameters, settings) {
            Ok(reports) => {
                let mut skipped = Vec::new();
                for report in reports {
                    self.log(format!(
                        "QC of {}: {} spikes, {} out of range, {} flat",
                        report.parameter, report.spikes, report.out_of_range, report.flat
                    ));
                    if report.range_skipped {
                        skipped.push(report.parameter);
                    }
                }
                if !skipped.is_empty() {
                    final_status = format!(
                        "Range test skipped, no limits for {}",
                        skipped.join(", ")
                    );
                    self.log(final_status.clone());
                }
            }
            // Parameters tested before the failure keep their flags.
            Err(e) => final_status = format!("Error creating QC flags: {e}"),
        }

        self.panels.refresh(&self.frame);
        self.set_status("Updating graphs");
        for name in self.plots.refresh_flags(&self.frame) {
            self.log(format!("Plot {name} closed"));
        }
        if final_status.starts_with("Error") {
            self.report_error(final_status);
        } else {
            self.set_status(final_status);
        }
    }

    /// Writes the dataset to `path`. Returns true on success.
    pub fn save(&mut self, path: &Path) -> bool {
        self.set_status("Saving data");
        match mooda_io::save(&self.frame, path) {
            Ok(()) => {
                self.log(format!("Data saved on file {}", path.display()));
                self.set_status("Ready");
                true
            }
            Err(e) => {
                self.report_error(format!("Error saving data: {e}"));
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mooda_core::{Column, Meaning};

    pub(crate) fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 1, 27)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    /// PSAL and TEMP with QC columns, a time QC column and unpaired DEPTH.
    pub(crate) fn frame() -> WaterFrame {
        let mut frame = WaterFrame::from_columns(
            (0..4).map(hour).collect(),
            vec![
                Column::new("PSAL", vec![38.0, 38.1, 38.2, 38.3]),
                Column::new("PSAL_QC", vec![0.0, 1.0, 2.0, 1.0]),
                Column::new("TEMP", vec![10.0, 11.0, f64::NAN, 13.0]),
                Column::new("TEMP_QC", vec![1.0, 4.0, 0.0, 0.0]),
                Column::new("TIME_QC", vec![1.0; 4]),
                Column::new("DEPTH", vec![20.0; 4]),
            ],
        )
        .unwrap();
        frame.meaning.insert(
            "TEMP".into(),
            Meaning {
                long_name: "Sea temperature".into(),
                units: "degC".into(),
            },
        );
        frame
    }

    fn loaded() -> Session {
        let mut session = Session::default();
        session.load(frame(), Path::new("obsea.nc"), false);
        session
    }

    #[test]
    fn test_load_lists_parameters_and_shows_qc_bar() {
        let session = loaded();
        assert!(session.is_loaded());
        assert_eq!(session.panels.drop.items(), ["PSAL", "TEMP"]);
        assert!(session.plots.get(QC_BAR_NAME).unwrap().visible);
        assert_eq!(session.status(), "Ready");
        assert!(session
            .datalog
            .lines()
            .iter()
            .any(|l| l == "Working with file obsea.nc"));
        assert_eq!(
            session.parameter_tooltip("TEMP").as_deref(),
            Some("Sea temperature (degC)")
        );
    }

    #[test]
    fn test_open_single_parameter_file() {
        let mut session = Session::default();
        let frame = WaterFrame::from_columns(
            vec![hour(0), hour(1)],
            vec![
                Column::new("TEMP", vec![10.0, 11.0]),
                Column::new("TEMP_QC", vec![0.0, 0.0]),
                Column::new("TIME", vec![0.0, 3600.0]),
            ],
        )
        .unwrap();
        session.load(frame, Path::new("temp.nc"), false);
        assert_eq!(session.panels.qc.items(), ["TEMP"]);
    }

    #[test]
    fn test_open_replaces_and_add_appends() {
        let mut session = loaded();
        let other = WaterFrame::from_columns(
            vec![hour(5)],
            vec![
                Column::new("CNDC", vec![4.0]),
                Column::new("CNDC_QC", vec![0.0]),
            ],
        )
        .unwrap();
        session.load(other.clone(), Path::new("b.nc"), true);
        assert_eq!(session.frame.parameters(), ["PSAL", "TEMP", "CNDC"]);
        assert_eq!(session.frame.len(), 5);

        session.load(other, Path::new("b.nc"), false);
        assert_eq!(session.frame.parameters(), ["CNDC"]);
    }

    #[test]
    fn test_drop_all_removes_columns_and_views() {
        let mut session = loaded();
        session.show_plot(PlotKind::TimeSeries {
            keys: vec!["TEMP".into()],
        });
        session.apply(PanelRequest::Drop {
            keys: vec!["TEMP".into()],
            flags: None,
            dropnan: false,
        });
        assert!(!session.frame.has_key("TEMP"));
        assert!(!session.frame.has_key("TEMP_QC"));
        assert!(session.status().contains("TEMP deleted"));
        assert_eq!(session.panels.drop.items(), ["PSAL"]);
        assert!(session.plots.get("TEMP").is_none());
        assert!(session.plots.get(QC_BAR_NAME).is_some());
    }

    #[test]
    fn test_drop_with_empty_flag_list_removes_columns() {
        let mut session = loaded();
        session.apply(PanelRequest::Drop {
            keys: vec!["TEMP".into()],
            flags: Some(Vec::new()),
            dropnan: false,
        });
        assert!(!session.frame.has_key("TEMP"));
        assert!(!session.frame.has_key("TEMP_QC"));
        assert!(session.status().contains("TEMP deleted"));
        assert_eq!(session.panels.drop.items(), ["PSAL"]);
    }

    #[test]
    fn test_drop_good_only_keeps_flags_zero_and_one() {
        let mut session = loaded();
        session.apply(PanelRequest::Drop {
            keys: vec!["TEMP".into()],
            flags: Some(mooda_core::REJECTED_FLAGS.to_vec()),
            dropnan: true,
        });
        let flags = session.frame.flags("TEMP").unwrap();
        assert!(flags.iter().all(|f| f.is_some_and(QcFlag::is_good)));
        assert!(session.frame.column("TEMP").unwrap().iter().all(|v| !v.is_nan()));
        assert_eq!(session.frame.len(), 2);
        assert_eq!(
            session.status(),
            "Data with QC Flags 2, 3, 4, 5, 6, 7, 8, 9, from TEMP, deleted"
        );
    }

    #[test]
    fn test_drop_unknown_key_reports_error() {
        let mut session = loaded();
        session.apply(PanelRequest::Drop {
            keys: vec!["NOPE".into()],
            flags: None,
            dropnan: false,
        });
        assert!(session.status().starts_with("Error deleting data"));
        assert!(session.frame.has_key("TEMP"));
    }

    #[test]
    fn test_rename_follows_views() {
        let mut session = loaded();
        session.show_plot(PlotKind::TimeSeries {
            keys: vec!["TEMP".into()],
        });
        session.apply(PanelRequest::Rename {
            old: "TEMP".into(),
            new: "SST".into(),
        });
        assert_eq!(session.frame.parameters(), ["PSAL", "SST"]);
        assert!(session.plots.get("SST").is_some());
        assert!(session.plots.get("TEMP").is_none());
        assert_eq!(session.datalog.last(), Some("Key name TEMP changed to SST."));
        assert_eq!(session.panels.rename.items(), ["PSAL", "SST"]);
    }

    #[test]
    fn test_rename_onto_existing_key_is_rejected() {
        let mut session = loaded();
        session.apply(PanelRequest::Rename {
            old: "TEMP".into(),
            new: "PSAL".into(),
        });
        assert!(session.status().starts_with("Error renaming TEMP"));
        assert_eq!(session.frame.parameters(), ["PSAL", "TEMP"]);
    }

    #[test]
    fn test_slice_logs_bounds() {
        let mut session = loaded();
        session.apply(PanelRequest::Slice {
            start: hour(1),
            end: hour(2),
        });
        assert_eq!(session.frame.len(), 2);
        assert_eq!(
            session.datalog.last(),
            Some("Dataframe sliced from 2017-01-27 01:00:00 to 2017-01-27 02:00:00.")
        );
        assert_eq!(session.panels.slice.options.start, "2017-01-27 01:00:00");
    }

    #[test]
    fn test_resample_refreshes_views() {
        let mut session = loaded();
        session.show_plot(PlotKind::Histogram {
            keys: vec!["PSAL".into()],
        });
        session.apply(PanelRequest::Resample(ResampleRule::Daily));
        assert_eq!(session.frame.len(), 1);
        assert!(session.plots.get("hist_PSAL").is_some());
        assert_eq!(session.status(), "Ready");
    }

    #[test]
    fn test_qc_shows_qc_bar() {
        let mut session = loaded();
        session.plots.get_mut(QC_BAR_NAME).unwrap().visible = false;
        session.apply(PanelRequest::Qc {
            parameters: None,
            settings: QcSettings::default(),
        });
        assert!(session.plots.get(QC_BAR_NAME).unwrap().visible);
        assert_eq!(session.status(), "Ready");
    }

    #[test]
    fn test_qc_refreshes_panels() {
        let mut session = loaded();
        session.panels.rename.options.new_name = "SST".into();
        session.apply(PanelRequest::Qc {
            parameters: None,
            settings: QcSettings::default(),
        });
        assert!(session.panels.rename.options.new_name.is_empty());
        assert_eq!(session.panels.qc.items(), ["PSAL", "TEMP"]);
    }

    #[test]
    fn test_qc_reports_skipped_range_test() {
        let mut session = Session::default();
        let frame = WaterFrame::from_columns(
            vec![hour(0), hour(1)],
            vec![
                Column::new("FOO", vec![1.0, 2.0]),
                Column::new("FOO_QC", vec![0.0, 0.0]),
            ],
        )
        .unwrap();
        session.load(frame, Path::new("foo.csv"), false);
        session.apply(PanelRequest::Qc {
            parameters: Some(vec!["FOO".into()]),
            settings: QcSettings::default(),
        });
        assert_eq!(session.status(), "Range test skipped, no limits for FOO");
    }

    #[test]
    fn test_same_plot_twice_is_one_view() {
        let mut session = loaded();
        let kind = PlotKind::TimeSeries {
            keys: vec!["PSAL".into()],
        };
        session.show_plot(kind.clone());
        session.show_plot(kind);
        // QC bar plus the time series.
        assert_eq!(session.plots.len(), 2);
    }

    #[test]
    fn test_merge_rules() {
        let mut session = loaded();
        assert!(!session.merge(WaterFrame::new()));

        let acoustic = WaterFrame::from_columns(
            vec![hour(0)],
            vec![
                Column::new("Sequence", vec![1.0]),
                Column::new("100", vec![-80.0]),
            ],
        )
        .unwrap();
        assert!(session.merge(acoustic.clone()));
        assert!(session.frame.has_key("TEMP"));
        assert_eq!(session.graphs(), vec![QC_BAR_NAME, SPECTROGRAM_NAME]);

        assert!(session.merge(acoustic));
        assert!(!session.frame.has_key("TEMP"));
        assert_eq!(session.frame.len(), 1);
    }

    #[test]
    fn test_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = loaded();
        assert!(session.save(&dir.path().join("data.csv")));
        assert!(!session.save(&dir.path().join("data.nc")));
        assert!(session.status().starts_with("Error saving data"));
    }

    #[test]
    fn test_new_project_clears_everything() {
        let mut session = loaded();
        session.new_project();
        assert!(!session.is_loaded());
        assert!(session.plots.is_empty());
        assert!(session.panels.drop.items().is_empty());
    }
}
