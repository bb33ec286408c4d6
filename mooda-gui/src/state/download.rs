//! Form state of the EGIM downloader window.

use std::collections::BTreeSet;

use chrono::{Local, NaiveDate};
use mooda_access::{first_observation_date, DateRange, DownloadRequest, Parameter};

/// User choices in the downloader that the coordinator does not track.
#[derive(Debug, Clone)]
pub struct DownloadForm {
    checked: BTreeSet<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Get the last N values instead of a date range (0 = use the range).
    pub last: u32,
    /// Acoustic time slots of the selected date.
    pub times: Vec<String>,
    pub time: Option<String>,
}

impl Default for DownloadForm {
    fn default() -> Self {
        Self {
            checked: BTreeSet::new(),
            start: first_observation_date(),
            end: Local::now().date_naive(),
            last: 0,
            times: Vec::new(),
            time: None,
        }
    }
}

impl DownloadForm {
    pub fn is_checked(&self, parameter: &str) -> bool {
        self.checked.contains(parameter)
    }

    pub fn set_checked(&mut self, parameter: &str, checked: bool) {
        if checked {
            self.checked.insert(parameter.to_string());
        } else {
            self.checked.remove(parameter);
        }
    }

    /// Forgets selections below the instrument level.
    pub fn reset(&mut self) {
        self.checked.clear();
        self.times.clear();
        self.time = None;
    }

    /// Sets the acoustic time slots of a newly picked date.
    pub fn set_times(&mut self, times: Vec<String>) {
        self.time = times.first().cloned();
        self.times = times;
    }

    /// Whether the date pickers apply.
    pub fn uses_date_range(&self) -> bool {
        self.last == 0
    }

    /// Keeps both dates inside `[first_observation_date, today]` with
    /// `start <= end`.
    pub fn clamp_dates(&mut self, today: NaiveDate) {
        let first = first_observation_date();
        self.start = self.start.clamp(first, today.max(first));
        self.end = self.end.clamp(self.start, today.max(self.start));
    }

    /// Builds the request for the current selection. Checked parameters
    /// are sent in the order of `parameters`.
    pub fn request(&self, parameters: &[Parameter]) -> Option<DownloadRequest> {
        let selected: Vec<String> = parameters
            .iter()
            .filter(|p| self.checked.contains(&p.name))
            .map(|p| p.name.clone())
            .collect();
        if selected.is_empty() {
            return None;
        }
        let range = if self.last > 0 {
            DateRange::Last(self.last)
        } else {
            DateRange::Between {
                start: self.start,
                end: self.end,
            }
        };
        Some(DownloadRequest::Parameters {
            parameters: selected,
            range,
        })
    }

    /// Builds the acoustic request for `date` and the chosen slot.
    pub fn acoustic_request(&self, date: Option<&str>) -> Option<DownloadRequest> {
        Some(DownloadRequest::Acoustic {
            date: date?.to_string(),
            hour_minute: self.time.clone()?,
        })
    }
}
