//! Selector panels.
//!
//! The drop, QC, rename, resample and slice panels share one component: a
//! checkable list of names plus panel-specific options. Confirming a panel
//! turns its state into a `PanelRequest` for the session.

use std::collections::BTreeSet;
use std::str::FromStr;

use mooda_core::{QcFlag, QcSettings, ResampleRule, WaterFrame, REJECTED_FLAGS};
use thiserror::Error;

use crate::state::session::PanelRequest;
use crate::util::{parse_datetime, DATETIME_FORMAT};

/// How many list items can be checked at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Single,
    Multiple,
}

/// Why a panel could not be confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    #[error("Nothing selected")]
    NothingSelected,
    #[error("A new name is required")]
    MissingName,
    #[error("Invalid time '{0}', expected YYYY-MM-DD hh:mm:ss")]
    InvalidTime(String),
}

/// Builds the request of a panel from its checked items.
pub trait PanelOptions {
    /// # Errors
    /// Returns a `PanelError` when the selection or options are incomplete.
    fn request(&self, checked: Vec<String>) -> Result<PanelRequest, PanelError>;
}

/// A checkable list with panel-specific options.
#[derive(Debug, Clone)]
pub struct SelectorPanel<O> {
    /// Whether the panel window is shown.
    pub open: bool,
    selection: Selection,
    items: Vec<String>,
    checked: BTreeSet<String>,
    pub options: O,
}

impl<O> SelectorPanel<O> {
    pub fn new(selection: Selection, options: O) -> Self {
        Self {
            open: false,
            selection,
            items: Vec::new(),
            checked: BTreeSet::new(),
            options,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Replaces the list. Checks on surviving items are kept; a single
    /// selection falls back to the first item.
    pub fn set_items(&mut self, items: Vec<String>) {
        self.checked.retain(|c| items.contains(c));
        if self.selection == Selection::Single && self.checked.is_empty() {
            if let Some(first) = items.first() {
                self.checked.insert(first.clone());
            }
        }
        self.items = items;
    }

    pub fn is_checked(&self, item: &str) -> bool {
        self.checked.contains(item)
    }

    pub fn set_checked(&mut self, item: &str, checked: bool) {
        if !self.items.iter().any(|i| i == item) {
            return;
        }
        if checked {
            if self.selection == Selection::Single {
                self.checked.clear();
            }
            self.checked.insert(item.to_string());
        } else {
            self.checked.remove(item);
        }
    }

    pub fn set_all(&mut self, checked: bool) {
        if checked && self.selection == Selection::Multiple {
            self.checked = self.items.iter().cloned().collect();
        } else if !checked {
            self.checked.clear();
        }
    }

    /// Checked items in list order.
    pub fn checked(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|i| self.checked.contains(*i))
            .cloned()
            .collect()
    }
}

impl<O: PanelOptions> SelectorPanel<O> {
    /// Request for the current state.
    ///
    /// # Errors
    /// Returns a `PanelError` when the selection or options are incomplete.
    pub fn confirm(&self) -> Result<PanelRequest, PanelError> {
        self.options.request(self.checked())
    }
}

/// Rows kept by the drop panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropMode {
    /// Remove the whole parameters.
    #[default]
    All,
    /// Keep only observations flagged 0 or 1.
    GoodOnly,
}

#[derive(Debug, Clone, Default)]
pub struct DropOptions {
    pub mode: DropMode,
    pub dropnan: bool,
}

impl PanelOptions for DropOptions {
    fn request(&self, checked: Vec<String>) -> Result<PanelRequest, PanelError> {
        if checked.is_empty() {
            return Err(PanelError::NothingSelected);
        }
        let flags = match self.mode {
            DropMode::All => None,
            DropMode::GoodOnly => Some(REJECTED_FLAGS.to_vec()),
        };
        Ok(PanelRequest::Drop {
            keys: checked,
            flags,
            dropnan: self.dropnan,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct QcOptions {
    /// Test every parameter regardless of the list.
    pub all: bool,
    pub settings: QcSettings,
}

impl PanelOptions for QcOptions {
    fn request(&self, checked: Vec<String>) -> Result<PanelRequest, PanelError> {
        let parameters = if self.all {
            None
        } else if checked.is_empty() {
            return Err(PanelError::NothingSelected);
        } else {
            Some(checked)
        };
        Ok(PanelRequest::Qc {
            parameters,
            settings: self.settings,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenameOptions {
    pub new_name: String,
}

impl PanelOptions for RenameOptions {
    fn request(&self, checked: Vec<String>) -> Result<PanelRequest, PanelError> {
        let old = checked
            .into_iter()
            .next()
            .ok_or(PanelError::NothingSelected)?;
        let new = self.new_name.trim();
        if new.is_empty() {
            return Err(PanelError::MissingName);
        }
        Ok(PanelRequest::Rename {
            old,
            new: new.to_string(),
        })
    }
}

/// The resample list holds rule labels; nothing else to configure.
#[derive(Debug, Clone, Default)]
pub struct ResampleOptions;

impl PanelOptions for ResampleOptions {
    fn request(&self, checked: Vec<String>) -> Result<PanelRequest, PanelError> {
        checked
            .first()
            .and_then(|label| ResampleRule::from_str(label).ok())
            .map(PanelRequest::Resample)
            .ok_or(PanelError::NothingSelected)
    }
}

/// Time bounds typed by the user, `YYYY-MM-DD hh:mm:ss`.
#[derive(Debug, Clone, Default)]
pub struct SliceOptions {
    pub start: String,
    pub end: String,
}

impl SliceOptions {
    /// Resets the bounds to the dataset's time span.
    pub fn reset(&mut self, frame: &WaterFrame) {
        match frame.time_range() {
            Some((start, end)) => {
                self.start = start.format(DATETIME_FORMAT).to_string();
                self.end = end.format(DATETIME_FORMAT).to_string();
            }
            None => {
                self.start.clear();
                self.end.clear();
            }
        }
    }
}

impl PanelOptions for SliceOptions {
    fn request(&self, _checked: Vec<String>) -> Result<PanelRequest, PanelError> {
        let start =
            parse_datetime(&self.start).ok_or_else(|| PanelError::InvalidTime(self.start.clone()))?;
        let end =
            parse_datetime(&self.end).ok_or_else(|| PanelError::InvalidTime(self.end.clone()))?;
        Ok(PanelRequest::Slice { start, end })
    }
}

/// The five selector panels of the main window.
#[derive(Debug, Clone)]
pub struct Panels {
    pub drop: SelectorPanel<DropOptions>,
    pub qc: SelectorPanel<QcOptions>,
    pub rename: SelectorPanel<RenameOptions>,
    pub resample: SelectorPanel<ResampleOptions>,
    pub slice: SelectorPanel<SliceOptions>,
}

impl Default for Panels {
    fn default() -> Self {
        let mut resample = SelectorPanel::new(Selection::Single, ResampleOptions);
        resample.set_items(
            ResampleRule::ALL
                .iter()
                .map(|r| r.label().to_string())
                .collect(),
        );
        let mut qc = SelectorPanel::new(Selection::Multiple, QcOptions::default());
        qc.options.all = true;
        Self {
            drop: SelectorPanel::new(Selection::Multiple, DropOptions::default()),
            qc,
            rename: SelectorPanel::new(Selection::Single, RenameOptions::default()),
            resample,
            slice: SelectorPanel::new(Selection::Single, SliceOptions::default()),
        }
    }
}

impl Panels {
    /// Re-lists the parameters of `frame` in every panel.
    pub fn refresh(&mut self, frame: &WaterFrame) {
        let parameters = frame.parameters();
        self.drop.set_items(parameters.clone());
        self.qc.set_items(parameters.clone());
        self.rename.set_items(parameters);
        self.rename.options.new_name.clear();
        self.slice.options.reset(frame);
    }

    pub fn close_all(&mut self) {
        self.drop.open = false;
        self.qc.open = false;
        self.rename.open = false;
        self.resample.open = false;
        self.slice.open = false;
    }
}

/// Flag choices offered by QC combo boxes, `None` meaning "skip".
#[must_use]
pub fn flag_choices() -> Vec<Option<QcFlag>> {
    std::iter::once(None)
        .chain((0..=QcFlag::MAX).filter_map(|v| QcFlag::new(v).ok()).map(Some))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::session::tests::frame;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_checks_survive_refresh() {
        let mut panel = SelectorPanel::new(Selection::Multiple, DropOptions::default());
        panel.set_items(names(&["PSAL", "TEMP"]));
        panel.set_checked("TEMP", true);
        panel.set_checked("NOPE", true);
        panel.set_items(names(&["CNDC", "TEMP"]));
        assert_eq!(panel.checked(), names(&["TEMP"]));
        panel.set_items(names(&["CNDC"]));
        assert!(panel.checked().is_empty());
    }

    #[test]
    fn test_single_selection() {
        let mut panel = SelectorPanel::new(Selection::Single, RenameOptions::default());
        panel.set_items(names(&["PSAL", "TEMP"]));
        assert_eq!(panel.checked(), names(&["PSAL"]));
        panel.set_checked("TEMP", true);
        assert_eq!(panel.checked(), names(&["TEMP"]));
        panel.set_all(true);
        assert_eq!(panel.checked(), names(&["TEMP"]));
    }

    #[test]
    fn test_drop_request() {
        let mut panel = SelectorPanel::new(Selection::Multiple, DropOptions::default());
        panel.set_items(names(&["PSAL", "TEMP"]));
        assert_eq!(panel.confirm(), Err(PanelError::NothingSelected));

        panel.set_checked("TEMP", true);
        assert_eq!(
            panel.confirm(),
            Ok(PanelRequest::Drop {
                keys: names(&["TEMP"]),
                flags: None,
                dropnan: false,
            })
        );

        panel.options.mode = DropMode::GoodOnly;
        panel.options.dropnan = true;
        match panel.confirm() {
            Ok(PanelRequest::Drop { flags, dropnan, .. }) => {
                assert_eq!(flags, Some(REJECTED_FLAGS.to_vec()));
                assert!(dropnan);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn test_rename_request_needs_name() {
        let mut panel = SelectorPanel::new(Selection::Single, RenameOptions::default());
        panel.set_items(names(&["TEMP"]));
        panel.options.new_name = "  ".into();
        assert_eq!(panel.confirm(), Err(PanelError::MissingName));
        panel.options.new_name = " SST ".into();
        assert_eq!(
            panel.confirm(),
            Ok(PanelRequest::Rename {
                old: "TEMP".into(),
                new: "SST".into(),
            })
        );
    }

    #[test]
    fn test_qc_request_scope() {
        let mut panel = SelectorPanel::new(Selection::Multiple, QcOptions::default());
        panel.set_items(names(&["PSAL", "TEMP"]));
        panel.options.all = true;
        assert!(matches!(
            panel.confirm(),
            Ok(PanelRequest::Qc {
                parameters: None,
                ..
            })
        ));
        panel.options.all = false;
        assert_eq!(panel.confirm(), Err(PanelError::NothingSelected));
        panel.set_checked("PSAL", true);
        assert!(matches!(
            panel.confirm(),
            Ok(PanelRequest::Qc { parameters: Some(p), .. }) if p == names(&["PSAL"])
        ));
    }

    #[test]
    fn test_resample_lists_rules() {
        let mut panels = Panels::default();
        assert_eq!(panels.resample.items().len(), ResampleRule::ALL.len());
        let label = ResampleRule::Daily.label();
        panels.resample.set_checked(label, true);
        assert_eq!(
            panels.resample.confirm(),
            Ok(PanelRequest::Resample(ResampleRule::Daily))
        );
    }

    #[test]
    fn test_slice_defaults_to_time_span() {
        let mut panels = Panels::default();
        panels.refresh(&frame());
        assert_eq!(panels.slice.options.start, "2017-01-27 00:00:00");
        assert_eq!(panels.slice.options.end, "2017-01-27 03:00:00");
        assert!(matches!(
            panels.slice.confirm(),
            Ok(PanelRequest::Slice { .. })
        ));

        panels.slice.options.end = "tomorrow".into();
        assert_eq!(
            panels.slice.confirm(),
            Err(PanelError::InvalidTime("tomorrow".into()))
        );
    }

    #[test]
    fn test_refresh_lists_parameters() {
        let mut panels = Panels::default();
        panels.refresh(&frame());
        assert_eq!(panels.drop.items(), names(&["PSAL", "TEMP"]).as_slice());
        assert_eq!(panels.rename.checked(), names(&["PSAL"]));
    }

    #[test]
    fn test_flag_choices() {
        let choices = flag_choices();
        assert_eq!(choices.len(), 11);
        assert_eq!(choices[0], None);
        assert_eq!(choices[5], Some(QcFlag::BAD));
    }
}
