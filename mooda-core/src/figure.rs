//! Plot-ready data extracted from a `WaterFrame`.
//!
//! Nothing here draws; the GUI turns these structures into plot items.
//! Time coordinates are Unix seconds.

use std::fmt;

use chrono::NaiveDateTime;
use ndarray::Array2;

use crate::{is_acoustic_key, Error, QcFlag, ResampleRule, Result, WaterFrame};

/// Averaging applied to time-series plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AverageTime {
    #[default]
    None,
    Minutely,
    Hourly,
    Daily,
    Weekly,
}

impl AverageTime {
    pub const ALL: [AverageTime; 5] = [
        AverageTime::None,
        AverageTime::Minutely,
        AverageTime::Hourly,
        AverageTime::Daily,
        AverageTime::Weekly,
    ];

    /// Resample rule backing this average.
    #[must_use]
    pub fn rule(self) -> Option<ResampleRule> {
        match self {
            AverageTime::None => None,
            AverageTime::Minutely => Some(ResampleRule::Minutely),
            AverageTime::Hourly => Some(ResampleRule::Hourly),
            AverageTime::Daily => Some(ResampleRule::Daily),
            AverageTime::Weekly => Some(ResampleRule::Weekly),
        }
    }

    /// Picks an average for a series of `count` values spanning `hours`.
    #[must_use]
    pub fn auto(count: usize, hours: f64) -> Self {
        if count <= 1000 {
            return AverageTime::None;
        }
        if hours > 3360.0 {
            AverageTime::Weekly
        } else if hours > 480.0 {
            AverageTime::Daily
        } else if hours > 20.0 {
            AverageTime::Hourly
        } else if hours > 0.33 {
            AverageTime::Minutely
        } else {
            AverageTime::None
        }
    }
}

impl fmt::Display for AverageTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule() {
            Some(rule) => f.write_str(rule.label()),
            None => f.write_str("None"),
        }
    }
}

/// One line of a time-series plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub key: String,
    /// `[unix seconds, value]` pairs, missing values skipped.
    pub points: Vec<[f64; 2]>,
}

/// Observations of a parameter grouped by QC flag.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagSeries {
    pub parameter: String,
    pub groups: Vec<(QcFlag, Vec<[f64; 2]>)>,
}

/// Flag counts of one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QcBar {
    pub parameter: String,
    /// Number of observations carrying each flag 0..=9.
    pub counts: [usize; 10],
}

/// Paired observations of two keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterCell {
    pub x_key: String,
    pub y_key: String,
    pub points: Vec<[f64; 2]>,
}

/// All pairwise scatter cells of a key set plus a histogram per key.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterMatrix {
    pub keys: Vec<String>,
    pub cells: Vec<ScatterCell>,
    pub diagonal: Vec<Histogram>,
}

impl ScatterMatrix {
    /// Cell in row `y_key`, column `x_key`.
    #[must_use]
    pub fn cell(&self, x_key: &str, y_key: &str) -> Option<&ScatterCell> {
        self.cells
            .iter()
            .find(|c| c.x_key == x_key && c.y_key == y_key)
    }
}

/// Histogram of one key.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub key: String,
    /// Left edge of the first bin.
    pub start: f64,
    pub bin_width: f64,
    pub counts: Vec<usize>,
    /// Mean of the valid values (`NaN` if none).
    pub mean: f64,
}

/// Acoustic intensity per timestamp and frequency bin.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    pub times: Vec<f64>,
    pub frequencies: Vec<f64>,
    /// Shape `(times, frequencies)`.
    pub values: Array2<f64>,
}

impl Spectrogram {
    /// Finite minimum and maximum of the intensities.
    #[must_use]
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn unix_seconds(t: NaiveDateTime) -> f64 {
    t.and_utc().timestamp() as f64
}

fn rolling_mean(points: &[[f64; 2]], window: usize) -> Vec<[f64; 2]> {
    let half = window / 2;
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(points.len() - 1);
            let slice = &points[lo..=hi];
            #[allow(clippy::cast_precision_loss)]
            let mean = slice.iter().map(|q| q[1]).sum::<f64>() / slice.len() as f64;
            [p[0], mean]
        })
        .collect()
}

fn averaged(index: &[NaiveDateTime], values: &[f64], rule: ResampleRule) -> Vec<[f64; 2]> {
    let mut out: Vec<(NaiveDateTime, f64, u32)> = Vec::new();
    for (t, v) in index.iter().zip(values) {
        if v.is_nan() {
            continue;
        }
        let bucket = rule.bucket_start(*t);
        match out.last_mut() {
            Some((b, sum, count)) if *b == bucket => {
                *sum += v;
                *count += 1;
            }
            _ => out.push((bucket, *v, 1)),
        }
    }
    out.into_iter()
        .map(|(b, sum, count)| [unix_seconds(b), sum / f64::from(count)])
        .collect()
}

impl WaterFrame {
    fn points(&self, key: &str) -> Result<Vec<[f64; 2]>> {
        Ok(self
            .index
            .iter()
            .zip(self.column(key)?)
            .filter(|(_, v)| !v.is_nan())
            .map(|(t, v)| [unix_seconds(*t), *v])
            .collect())
    }

    /// Time-series lines of `keys`, optionally averaged per `average` bucket
    /// and smoothed with a centred moving window of `rolling` points
    /// (`0` or `1` disables smoothing).
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if any key is missing.
    pub fn tsplot<S: AsRef<str>>(
        &self,
        keys: &[S],
        rolling: usize,
        average: AverageTime,
    ) -> Result<Vec<Series>> {
        keys.iter()
            .map(|key| {
                let key = key.as_ref();
                let mut points = match average.rule() {
                    Some(rule) => averaged(&self.index, self.column(key)?, rule),
                    None => self.points(key)?,
                };
                if rolling > 1 && !points.is_empty() {
                    points = rolling_mean(&points, rolling);
                }
                Ok(Series {
                    key: key.to_string(),
                    points,
                })
            })
            .collect()
    }

    /// Average suited to plotting `keys`, based on the longest series.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if any key is missing.
    pub fn auto_average<S: AsRef<str>>(&self, keys: &[S]) -> Result<AverageTime> {
        let mut longest: Option<(usize, f64)> = None;
        for key in keys {
            let valid: Vec<NaiveDateTime> = self
                .index
                .iter()
                .zip(self.column(key.as_ref())?)
                .filter(|(_, v)| !v.is_nan())
                .map(|(t, _)| *t)
                .collect();
            if longest.is_some_and(|(count, _)| count >= valid.len()) {
                continue;
            }
            let hours = match (valid.first(), valid.last()) {
                #[allow(clippy::cast_precision_loss)]
                (Some(first), Some(last)) => (*last - *first).num_seconds() as f64 / 3600.0,
                _ => 0.0,
            };
            longest = Some((valid.len(), hours));
        }
        Ok(longest.map_or(AverageTime::None, |(count, hours)| {
            AverageTime::auto(count, hours)
        }))
    }

    /// Observations of `parameter` grouped by their QC flag, ascending.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if the parameter or its QC column is
    /// missing.
    pub fn qcplot(&self, parameter: &str) -> Result<FlagSeries> {
        let values = self.column(parameter)?;
        let flags = self.flags(parameter)?;
        let mut groups: Vec<(QcFlag, Vec<[f64; 2]>)> = Vec::new();
        for ((t, v), flag) in self.index.iter().zip(values).zip(flags) {
            let Some(flag) = flag else { continue };
            if v.is_nan() {
                continue;
            }
            let point = [unix_seconds(*t), *v];
            match groups.iter_mut().find(|(f, _)| *f == flag) {
                Some((_, points)) => points.push(point),
                None => groups.push((flag, vec![point])),
            }
        }
        groups.sort_by_key(|(f, _)| *f);
        Ok(FlagSeries {
            parameter: parameter.to_string(),
            groups,
        })
    }

    /// Flag counts of every parameter.
    #[must_use]
    pub fn qcbarplot(&self) -> Vec<QcBar> {
        self.parameters()
            .into_iter()
            .filter_map(|parameter| {
                let flags = self.flags(&parameter).ok()?;
                let mut counts = [0; 10];
                for flag in flags.into_iter().flatten() {
                    counts[usize::from(flag.value())] += 1;
                }
                Some(QcBar { parameter, counts })
            })
            .collect()
    }

    /// Histograms of `keys` with `bins` equal-width bins.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if any key is missing.
    pub fn hist<S: AsRef<str>>(&self, keys: &[S], bins: usize) -> Result<Vec<Histogram>> {
        let bins = bins.max(1);
        keys.iter()
            .map(|key| {
                let key = key.as_ref();
                let valid: Vec<f64> = self
                    .column(key)?
                    .iter()
                    .copied()
                    .filter(|v| v.is_finite())
                    .collect();
                let (min, max) = valid
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                let mut counts = vec![0; bins];
                if valid.is_empty() {
                    return Ok(Histogram {
                        key: key.to_string(),
                        start: 0.0,
                        bin_width: 1.0,
                        counts,
                        mean: f64::NAN,
                    });
                }
                #[allow(clippy::cast_precision_loss)]
                let width = if max > min {
                    (max - min) / bins as f64
                } else {
                    1.0
                };
                for v in &valid {
                    #[allow(
                        clippy::cast_possible_truncation,
                        clippy::cast_sign_loss,
                        clippy::cast_precision_loss
                    )]
                    let bin = (((v - min) / width) as usize).min(bins - 1);
                    counts[bin] += 1;
                }
                #[allow(clippy::cast_precision_loss)]
                let mean = valid.iter().sum::<f64>() / valid.len() as f64;
                Ok(Histogram {
                    key: key.to_string(),
                    start: min,
                    bin_width: width,
                    counts,
                    mean,
                })
            })
            .collect()
    }

    /// Pairwise scatter data of `keys`.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if any key is missing.
    pub fn scatter_matrix<S: AsRef<str>>(&self, keys: &[S]) -> Result<ScatterMatrix> {
        let keys: Vec<String> = keys.iter().map(|k| k.as_ref().to_string()).collect();
        let mut cells = Vec::new();
        for y_key in &keys {
            let ys = self.column(y_key)?;
            for x_key in keys.iter().filter(|k| *k != y_key) {
                let xs = self.column(x_key)?;
                let points = xs
                    .iter()
                    .zip(ys)
                    .filter(|(x, y)| !x.is_nan() && !y.is_nan())
                    .map(|(x, y)| [*x, *y])
                    .collect();
                cells.push(ScatterCell {
                    x_key: x_key.clone(),
                    y_key: y_key.clone(),
                    points,
                });
            }
        }
        let diagonal = self.hist(keys.as_slice(), 20)?;
        Ok(ScatterMatrix {
            keys,
            cells,
            diagonal,
        })
    }

    /// Intensity grid of the numeric frequency columns.
    ///
    /// # Errors
    /// Returns `Error::NoAcousticData` if the frame has no frequency columns.
    pub fn spectrogram(&self) -> Result<Spectrogram> {
        let mut bins: Vec<(f64, &[f64])> = self
            .columns
            .iter()
            .filter(|c| is_acoustic_key(&c.name))
            .filter_map(|c| Some((c.name.trim().parse::<f64>().ok()?, c.values.as_slice())))
            .collect();
        if bins.is_empty() {
            return Err(Error::NoAcousticData);
        }
        bins.sort_by(|a, b| a.0.total_cmp(&b.0));

        let values = Array2::from_shape_fn((self.len(), bins.len()), |(row, col)| bins[col].1[row]);
        Ok(Spectrogram {
            times: self.index.iter().map(|t| unix_seconds(*t)).collect(),
            frequencies: bins.iter().map(|(f, _)| *f).collect(),
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::tests::{hour, temp_frame};
    use crate::Column;
    use approx::assert_relative_eq;

    #[test]
    fn test_auto_average_thresholds() {
        assert_eq!(AverageTime::auto(500, 5000.0), AverageTime::None);
        assert_eq!(AverageTime::auto(2000, 5000.0), AverageTime::Weekly);
        assert_eq!(AverageTime::auto(2000, 500.0), AverageTime::Daily);
        assert_eq!(AverageTime::auto(2000, 21.0), AverageTime::Hourly);
        assert_eq!(AverageTime::auto(2000, 1.0), AverageTime::Minutely);
        assert_eq!(AverageTime::auto(2000, 0.1), AverageTime::None);
    }

    #[test]
    fn test_tsplot_skips_missing() {
        let wf = temp_frame();
        let series = wf.tsplot(&["TEMP"], 0, AverageTime::None).unwrap();
        assert_eq!(series[0].points.len(), 3);
        assert_relative_eq!(series[0].points[0][0], unix_seconds(hour(0)));
    }

    #[test]
    fn test_tsplot_rolling() {
        let wf = temp_frame();
        let series = wf.tsplot(&["PSAL"], 3, AverageTime::None).unwrap();
        assert_relative_eq!(series[0].points[1][1], 38.1, epsilon = 1e-9);
        assert_relative_eq!(series[0].points[0][1], 38.05, epsilon = 1e-9);
    }

    #[test]
    fn test_tsplot_average_daily() {
        let wf = temp_frame();
        let series = wf.tsplot(&["PSAL"], 0, AverageTime::Daily).unwrap();
        assert_eq!(series[0].points.len(), 1);
        assert_relative_eq!(series[0].points[0][1], 38.15, epsilon = 1e-9);
    }

    #[test]
    fn test_tsplot_missing_key() {
        let wf = temp_frame();
        assert_eq!(
            wf.tsplot(&["CNDC"], 0, AverageTime::None),
            Err(Error::KeyNotFound("CNDC".into()))
        );
    }

    #[test]
    fn test_qcplot_groups() {
        let wf = temp_frame();
        let qc = wf.qcplot("PSAL").unwrap();
        let flags: Vec<u8> = qc.groups.iter().map(|(f, _)| f.value()).collect();
        assert_eq!(flags, vec![0, 1, 2]);
        assert_eq!(qc.groups[1].1.len(), 2);
    }

    #[test]
    fn test_qcbarplot_counts() {
        let bars = temp_frame().qcbarplot();
        let temp = bars.iter().find(|b| b.parameter == "TEMP").unwrap();
        assert_eq!(temp.counts[0], 2);
        assert_eq!(temp.counts[1], 1);
        assert_eq!(temp.counts[4], 1);
    }

    #[test]
    fn test_hist_mean_and_counts() {
        let wf = temp_frame();
        let h = &wf.hist(&["TEMP"], 3).unwrap()[0];
        assert_eq!(h.counts.iter().sum::<usize>(), 3);
        assert_relative_eq!(h.mean, 34.0 / 3.0, epsilon = 1e-9);
        assert_eq!(h.counts[2], 1);
    }

    #[test]
    fn test_scatter_matrix_pairs() {
        let wf = temp_frame();
        let m = wf.scatter_matrix(&["TEMP", "PSAL"]).unwrap();
        assert_eq!(m.cells.len(), 2);
        assert_eq!(m.cell("TEMP", "PSAL").unwrap().points.len(), 3);
        assert_eq!(m.diagonal.len(), 2);
    }

    #[test]
    fn test_spectrogram() {
        let wf = WaterFrame::from_columns(
            vec![hour(0), hour(1)],
            vec![
                Column::new("Sequence", vec![1.0, 2.0]),
                Column::new("200", vec![3.0, 4.0]),
                Column::new("100", vec![1.0, 2.0]),
            ],
        )
        .unwrap();
        let s = wf.spectrogram().unwrap();
        assert_eq!(s.frequencies, vec![100.0, 200.0]);
        assert_eq!(s.values.shape(), &[2, 2]);
        assert_relative_eq!(s.values[[1, 1]], 4.0);
        assert_eq!(s.range(), Some((1.0, 4.0)));
        assert_eq!(temp_frame().spectrogram(), Err(Error::NoAcousticData));
    }
}
