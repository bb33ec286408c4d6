//! UI state for pane visibility and the data list.

use crate::state::plots::PlotKind;
use crate::viewer::Colormap;

/// How the Plot button (and a click in the data list) interprets the
/// selected parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotMode {
    #[default]
    TimeSeries,
    Histogram,
    Multiparameter,
    Correlation,
    Qc,
}

impl PlotMode {
    pub const ALL: [PlotMode; 5] = [
        PlotMode::TimeSeries,
        PlotMode::Histogram,
        PlotMode::Multiparameter,
        PlotMode::Correlation,
        PlotMode::Qc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PlotMode::TimeSeries => "Time series plot",
            PlotMode::Histogram => "Histogram",
            PlotMode::Multiparameter => "Multiparameter",
            PlotMode::Correlation => "Correlation",
            PlotMode::Qc => "QC of the parameter",
        }
    }

    /// Modes that plot as soon as an item of the data list is clicked.
    pub fn plots_on_click(self) -> bool {
        matches!(self, PlotMode::TimeSeries | PlotMode::Histogram)
    }

    /// The view to open for `keys`, or `None` when nothing is selected.
    ///
    /// The QC mode only looks at the first key.
    pub fn plot_request(self, keys: &[String]) -> Option<PlotKind> {
        let first = keys.first()?;
        let keys = keys.to_vec();
        Some(match self {
            PlotMode::TimeSeries | PlotMode::Multiparameter => PlotKind::TimeSeries { keys },
            PlotMode::Histogram => PlotKind::Histogram { keys },
            PlotMode::Correlation => PlotKind::ScatterMatrix { keys },
            PlotMode::Qc => PlotKind::Flags {
                parameter: first.clone(),
            },
        })
    }
}

/// UI pane visibility and toggle state.
#[derive(Debug, Default)]
pub struct UiState {
    /// Parameters selected in the data list, in click order.
    pub selected_keys: Vec<String>,
    pub plot_mode: PlotMode,
    pub show_datalog: bool,
    pub show_metadata: bool,
    pub show_parameters: bool,
    pub show_downloader: bool,
    /// Text of the open password prompt.
    pub password_prompt: Option<String>,
    /// Whether a file is being read in the background.
    pub is_loading: bool,
    pub colormap: Colormap,
}

impl UiState {
    /// Selects `key` alone, or toggles it when `extend` is set.
    pub fn select_key(&mut self, key: &str, extend: bool) {
        if !extend {
            self.selected_keys.clear();
            self.selected_keys.push(key.to_string());
            return;
        }
        if let Some(pos) = self.selected_keys.iter().position(|k| k == key) {
            self.selected_keys.remove(pos);
        } else {
            self.selected_keys.push(key.to_string());
        }
    }

    /// Drops selections that are no longer parameters.
    pub fn retain_keys(&mut self, parameters: &[String]) {
        self.selected_keys.retain(|k| parameters.contains(k));
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selected_keys.iter().any(|k| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_plot_request_per_mode() {
        let selected = keys(&["TEMP", "PSAL"]);
        assert_eq!(
            PlotMode::Multiparameter.plot_request(&selected).unwrap().name(),
            "TEMP_PSAL"
        );
        assert_eq!(
            PlotMode::Histogram.plot_request(&selected).unwrap().name(),
            "hist_TEMP_PSAL"
        );
        assert_eq!(
            PlotMode::Qc.plot_request(&selected),
            Some(PlotKind::Flags {
                parameter: "TEMP".into()
            })
        );
        assert!(matches!(
            PlotMode::Correlation.plot_request(&selected),
            Some(PlotKind::ScatterMatrix { .. })
        ));
        assert_eq!(PlotMode::TimeSeries.plot_request(&[]), None);
    }

    #[test]
    fn test_click_plotting_modes() {
        assert!(PlotMode::TimeSeries.plots_on_click());
        assert!(PlotMode::Histogram.plots_on_click());
        assert!(!PlotMode::Multiparameter.plots_on_click());
        assert!(!PlotMode::Correlation.plots_on_click());
        assert!(!PlotMode::Qc.plots_on_click());
    }

    #[test]
    fn test_select_key() {
        let mut state = UiState::default();
        state.select_key("TEMP", false);
        state.select_key("PSAL", true);
        assert_eq!(state.selected_keys, keys(&["TEMP", "PSAL"]));
        state.select_key("TEMP", true);
        assert_eq!(state.selected_keys, keys(&["PSAL"]));
        state.select_key("CNDC", false);
        assert_eq!(state.selected_keys, keys(&["CNDC"]));

        state.retain_keys(&keys(&["TEMP"]));
        assert!(state.selected_keys.is_empty());
    }
}
