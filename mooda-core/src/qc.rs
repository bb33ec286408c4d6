//! Quality-control tests.
//!
//! Each test writes flags into the `<PARAM>_QC` column of the tested
//! parameter and returns the number of observations it flagged.

use crate::{qc_key, Error, QcFlag, Result, WaterFrame};

/// Rolling window used when the caller passes `0`.
#[must_use]
pub fn auto_window(len: usize) -> usize {
    (len / 10).clamp(3, 100)
}

fn effective_window(window: usize, len: usize) -> usize {
    if window == 0 {
        auto_window(len)
    } else {
        window.max(2)
    }
}

/// Plausible limits `(min, max)` for well-known OceanSITES parameters.
#[must_use]
pub fn range_limits(parameter: &str) -> Option<(f64, f64)> {
    let limits = match parameter {
        "TEMP" | "DRYT" => (-2.5, 40.0),
        "PSAL" => (2.0, 41.0),
        "CNDC" => (0.0, 7.0),
        "PRES" => (-5.0, 11_000.0),
        "DOX2" | "DOXY" => (0.0, 600.0),
        "CPHL" => (0.0, 100.0),
        "TURB" => (0.0, 1000.0),
        "WSPD" => (0.0, 100.0),
        "ATMS" => (850.0, 1100.0),
        _ => return None,
    };
    Some(limits)
}

/// Settings of one QC run. `None` disables the corresponding step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QcSettings {
    /// Flag every observation is reset to before testing.
    pub reset: Option<QcFlag>,
    /// Flag assigned by the range test.
    pub range: Option<QcFlag>,
    /// Flag assigned by the flat test.
    pub flat: Option<QcFlag>,
    /// Flag assigned by the spike test.
    pub spike: Option<QcFlag>,
    /// Maximum deviation from the rolling mean accepted by the spike test.
    pub threshold: f64,
    /// Rolling window size (0 = auto).
    pub window: usize,
    /// Final `(from, to)` flag translation.
    pub flag2flag: Option<(QcFlag, QcFlag)>,
}

impl Default for QcSettings {
    fn default() -> Self {
        Self {
            reset: Some(QcFlag::NO_QC),
            range: Some(QcFlag::BAD),
            flat: Some(QcFlag::BAD),
            spike: Some(QcFlag::BAD),
            threshold: 2.0,
            window: 0,
            flag2flag: Some((QcFlag::NO_QC, QcFlag::GOOD)),
        }
    }
}

/// Outcome of `WaterFrame::apply_qc` for one parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QcReport {
    pub parameter: String,
    pub spikes: usize,
    pub out_of_range: usize,
    pub flat: usize,
    /// True if the range test had no limits for this parameter.
    pub range_skipped: bool,
}

impl WaterFrame {
    /// Sets every flag of `parameter` to `flag`.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if the QC column is missing.
    pub fn reset_flag(&mut self, parameter: &str, flag: QcFlag) -> Result<()> {
        self.column_mut(&qc_key(parameter))?.fill(flag.as_f64());
        Ok(())
    }

    /// Flags observations that deviate more than `threshold` from the mean
    /// of their centred rolling window (the observation itself excluded).
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if the parameter or its QC column is
    /// missing.
    pub fn spike_test(
        &mut self,
        parameter: &str,
        window: usize,
        threshold: f64,
        flag: QcFlag,
    ) -> Result<usize> {
        let values = self.column(parameter)?.to_vec();
        let half = effective_window(window, values.len()) / 2;
        let qc = self.column_mut(&qc_key(parameter))?;

        let mut flagged = 0;
        for (i, &value) in values.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(values.len() - 1);
            let (sum, count) = (lo..=hi)
                .filter(|&j| j != i && !values[j].is_nan())
                .fold((0.0, 0_u32), |(s, c), j| (s + values[j], c + 1));
            if count == 0 {
                continue;
            }
            if (value - sum / f64::from(count)).abs() > threshold {
                qc[i] = flag.as_f64();
                flagged += 1;
            }
        }
        Ok(flagged)
    }

    /// Flags observations outside the built-in limits of `parameter`.
    ///
    /// Returns `Ok(None)` when no limits are known for the parameter.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if the parameter or its QC column is
    /// missing.
    pub fn range_test(&mut self, parameter: &str, flag: QcFlag) -> Result<Option<usize>> {
        let values = self.column(parameter)?.to_vec();
        let qc = self.column_mut(&qc_key(parameter))?;
        let Some((min, max)) = range_limits(parameter) else {
            return Ok(None);
        };

        let mut flagged = 0;
        for (q, v) in qc.iter_mut().zip(&values) {
            if !v.is_nan() && (*v < min || *v > max) {
                *q = flag.as_f64();
                flagged += 1;
            }
        }
        Ok(Some(flagged))
    }

    /// Flags observations that lie inside a window of identical values.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if the parameter or its QC column is
    /// missing.
    pub fn flat_test(&mut self, parameter: &str, window: usize, flag: QcFlag) -> Result<usize> {
        let values = self.column(parameter)?.to_vec();
        let window = effective_window(window, values.len());
        let qc = self.column_mut(&qc_key(parameter))?;

        let mut mark = vec![false; values.len()];
        if values.len() >= window {
            for start in 0..=values.len() - window {
                let slice = &values[start..start + window];
                #[allow(clippy::float_cmp)]
                let flat = !slice[0].is_nan() && slice.iter().all(|v| *v == slice[0]);
                if flat {
                    mark[start..start + window].fill(true);
                }
            }
        }

        let mut flagged = 0;
        for (q, m) in qc.iter_mut().zip(&mark) {
            if *m {
                *q = flag.as_f64();
                flagged += 1;
            }
        }
        Ok(flagged)
    }

    /// Replaces every `from` flag of `parameter` with `to`.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if the QC column is missing.
    pub fn flag2flag(&mut self, parameter: &str, from: QcFlag, to: QcFlag) -> Result<usize> {
        let mut changed = 0;
        for q in self.column_mut(&qc_key(parameter))?.iter_mut() {
            if QcFlag::from_f64(*q) == Some(from) {
                *q = to.as_f64();
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Runs the enabled tests on each parameter in the order
    /// reset, spike, range, flat, flag-to-flag.
    ///
    /// `parameters = None` tests every parameter of the frame.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` for the first parameter that does not
    /// exist. Parameters processed before it keep their new flags.
    pub fn apply_qc(
        &mut self,
        parameters: Option<&[String]>,
        settings: &QcSettings,
    ) -> Result<Vec<QcReport>> {
        let targets = match parameters {
            Some(list) => list.to_vec(),
            None => self.parameters(),
        };
        if targets.is_empty() && self.is_empty() {
            return Err(Error::EmptyFrame);
        }

        let mut reports = Vec::with_capacity(targets.len());
        for parameter in targets {
            if parameter.ends_with(crate::frame::QC_SUFFIX) {
                continue;
            }
            let mut report = QcReport {
                parameter: parameter.clone(),
                ..QcReport::default()
            };
            if let Some(flag) = settings.reset {
                self.reset_flag(&parameter, flag)?;
            }
            if let Some(flag) = settings.spike {
                report.spikes =
                    self.spike_test(&parameter, settings.window, settings.threshold, flag)?;
            }
            if let Some(flag) = settings.range {
                match self.range_test(&parameter, flag)? {
                    Some(n) => report.out_of_range = n,
                    None => report.range_skipped = true,
                }
            }
            if let Some(flag) = settings.flat {
                report.flat = self.flat_test(&parameter, settings.window, flag)?;
            }
            if let Some((from, to)) = settings.flag2flag {
                self.flag2flag(&parameter, from, to)?;
            }
            reports.push(report);
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::tests::hour;
    use crate::Column;

    fn frame(values: Vec<f64>) -> WaterFrame {
        let n = values.len();
        let index = (0..n)
            .map(|i| hour(0) + chrono::Duration::minutes(i64::try_from(i).unwrap()))
            .collect();
        WaterFrame::from_columns(
            index,
            vec![
                Column::new("TEMP", values),
                Column::new("TEMP_QC", vec![0.0; n]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_auto_window() {
        assert_eq!(auto_window(5), 3);
        assert_eq!(auto_window(500), 50);
        assert_eq!(auto_window(50_000), 100);
    }

    #[test]
    fn test_spike_detected() {
        let mut wf = frame(vec![10.0, 10.1, 10.0, 25.0, 10.1, 10.0, 10.1]);
        let n = wf.spike_test("TEMP", 7, 6.0, QcFlag::BAD).unwrap();
        assert_eq!(n, 1);
        assert_eq!(wf.column("TEMP_QC").unwrap()[3], 4.0);
    }

    #[test]
    fn test_range_test_flags_out_of_limits() {
        let mut wf = frame(vec![12.0, 55.0, -10.0, f64::NAN]);
        assert_eq!(wf.range_test("TEMP", QcFlag::BAD).unwrap(), Some(2));
        assert_eq!(wf.column("TEMP_QC").unwrap(), &[0.0, 4.0, 4.0, 0.0]);
    }

    #[test]
    fn test_range_test_unknown_parameter() {
        let mut wf = frame(vec![1.0]);
        wf.rename("TEMP", "XYZ").unwrap();
        assert_eq!(wf.range_test("XYZ", QcFlag::BAD).unwrap(), None);
    }

    #[test]
    fn test_flat_test() {
        let mut wf = frame(vec![1.0, 2.0, 2.0, 2.0, 3.0, 4.0]);
        assert_eq!(wf.flat_test("TEMP", 3, QcFlag::BAD).unwrap(), 3);
        assert_eq!(wf.column("TEMP_QC").unwrap(), &[0.0, 4.0, 4.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_apply_qc_order() {
        let mut wf = frame(vec![10.0, 10.2, 10.1, 10.3, 99.0, 10.2, 10.1]);
        let reports = wf.apply_qc(None, &QcSettings::default()).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].spikes >= 1);
        assert_eq!(reports[0].out_of_range, 1);
        // Untested observations were translated from 0 to 1.
        let flags = wf.flags("TEMP").unwrap();
        assert_eq!(flags[4], Some(QcFlag::BAD));
        assert!(flags.iter().all(|f| matches!(f, Some(f) if f.value() == 1 || f.value() == 4)));
    }

    #[test]
    fn test_apply_qc_missing_parameter() {
        let mut wf = frame(vec![1.0, 2.0]);
        let result = wf.apply_qc(Some(&["PSAL".to_string()]), &QcSettings::default());
        assert_eq!(result, Err(Error::KeyNotFound("PSAL_QC".into())));
    }
}
