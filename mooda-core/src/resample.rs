//! Time-bucket resampling.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};
use rayon::prelude::*;

use crate::{Column, Error, QcFlag, Result, WaterFrame};

/// Resampling period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResampleRule {
    Minutely,
    Hourly,
    Daily,
    Weekly,
}

impl ResampleRule {
    /// All rules, shortest period first.
    pub const ALL: [ResampleRule; 4] = [
        ResampleRule::Minutely,
        ResampleRule::Hourly,
        ResampleRule::Daily,
        ResampleRule::Weekly,
    ];

    /// Short rule code (`T`, `H`, `D`, `W`).
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            ResampleRule::Minutely => "T",
            ResampleRule::Hourly => "H",
            ResampleRule::Daily => "D",
            ResampleRule::Weekly => "W",
        }
    }

    /// Display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ResampleRule::Minutely => "Minutely",
            ResampleRule::Hourly => "Hourly",
            ResampleRule::Daily => "Daily",
            ResampleRule::Weekly => "Weekly",
        }
    }

    /// Start of the bucket containing `t`. Weeks start on Monday.
    #[must_use]
    pub fn bucket_start(self, t: NaiveDateTime) -> NaiveDateTime {
        let date = t.date();
        match self {
            ResampleRule::Minutely => date.and_time(
                NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(NaiveTime::MIN),
            ),
            ResampleRule::Hourly => {
                date.and_time(NaiveTime::from_hms_opt(t.hour(), 0, 0).unwrap_or(NaiveTime::MIN))
            }
            ResampleRule::Daily => date.and_time(NaiveTime::MIN),
            ResampleRule::Weekly => {
                let offset = i64::from(date.weekday().num_days_from_monday());
                (date - Duration::days(offset)).and_time(NaiveTime::MIN)
            }
        }
    }
}

impl fmt::Display for ResampleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResampleRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ResampleRule::ALL
            .into_iter()
            .find(|r| r.code().eq_ignore_ascii_case(s) || r.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidRule(s.to_string()))
    }
}

fn mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0_u32), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / f64::from(count)
    }
}

fn worst_flag(values: &[f64]) -> f64 {
    values
        .iter()
        .filter_map(|&v| QcFlag::from_f64(v))
        .max()
        .map_or(f64::NAN, QcFlag::as_f64)
}

impl WaterFrame {
    /// Aggregates rows into `rule` buckets.
    ///
    /// Values are averaged ignoring missing ones, QC columns keep the worst
    /// (highest) flag of the bucket, and buckets without rows are omitted.
    pub fn resample(&mut self, rule: ResampleRule) {
        let mut index = Vec::new();
        let mut bounds = Vec::new();
        let mut start = 0;
        for (i, t) in self.index.iter().enumerate() {
            let bucket = rule.bucket_start(*t);
            if index.last() != Some(&bucket) {
                if i > 0 {
                    bounds.push(start..i);
                }
                index.push(bucket);
                start = i;
            }
        }
        if !self.index.is_empty() {
            bounds.push(start..self.index.len());
        }

        let columns: Vec<Column> = self
            .columns
            .par_iter()
            .map(|column| {
                let aggregate: fn(&[f64]) -> f64 = if column.is_qc() { worst_flag } else { mean };
                let values = bounds
                    .iter()
                    .map(|range| aggregate(&column.values[range.clone()]))
                    .collect();
                Column::new(column.name.clone(), values)
            })
            .collect();

        self.index = index;
        self.columns = columns;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::tests::hour;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    #[test]
    fn test_rule_parsing() {
        assert_eq!("H".parse::<ResampleRule>().unwrap(), ResampleRule::Hourly);
        assert_eq!("weekly".parse::<ResampleRule>().unwrap(), ResampleRule::Weekly);
        assert!("fortnightly".parse::<ResampleRule>().is_err());
    }

    #[test]
    fn test_weekly_bucket_starts_monday() {
        // 2017-01-27 is a Friday.
        let monday = NaiveDate::from_ymd_opt(2017, 1, 23)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(ResampleRule::Weekly.bucket_start(hour(13)), monday);
    }

    #[test]
    fn test_resample_daily_mean_and_worst_flag() {
        let next_day = hour(0) + Duration::days(1);
        let mut wf = WaterFrame::from_columns(
            vec![hour(1), hour(5), hour(9), next_day],
            vec![
                Column::new("TEMP", vec![10.0, f64::NAN, 14.0, 20.0]),
                Column::new("TEMP_QC", vec![1.0, 4.0, 1.0, f64::NAN]),
            ],
        )
        .unwrap();

        wf.resample(ResampleRule::Daily);

        assert_eq!(wf.index(), &[hour(0), next_day]);
        let temp = wf.column("TEMP").unwrap();
        assert_relative_eq!(temp[0], 12.0);
        assert_relative_eq!(temp[1], 20.0);
        let qc = wf.column("TEMP_QC").unwrap();
        assert_relative_eq!(qc[0], 4.0);
        assert!(qc[1].is_nan());
    }

    #[test]
    fn test_resample_skips_empty_buckets() {
        let mut wf = WaterFrame::from_columns(
            vec![hour(0), hour(10)],
            vec![Column::new("TEMP", vec![1.0, 2.0])],
        )
        .unwrap();
        wf.resample(ResampleRule::Hourly);
        assert_eq!(wf.len(), 2);
    }
}
