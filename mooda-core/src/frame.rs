//! The `WaterFrame` table and its structural operations.
//!
//! Every column shares the frame's time index. Parameter columns hold
//! measurements (`NaN` = missing); `<PARAM>_QC` columns hold the matching QC
//! flags encoded as whole numbers (`NaN` = no flag).

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, QcFlag, Result};

/// Suffix that marks a QC flag column.
pub const QC_SUFFIX: &str = "_QC";

/// Name of the QC column paired with `parameter`.
#[must_use]
pub fn qc_key(parameter: &str) -> String {
    format!("{parameter}{QC_SUFFIX}")
}

/// True for columns produced by acoustic downloads: `Sequence`,
/// `Data Points`, and frequency bins whose names parse as numbers.
#[must_use]
pub fn is_acoustic_key(key: &str) -> bool {
    key == "Sequence" || key == "Data Points" || key.trim().parse::<f64>().is_ok()
}

/// A metadata value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum MetaValue {
    /// Numeric attribute.
    Number(f64),
    /// Text attribute.
    Text(String),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Number(n) => write!(f, "{n}"),
            MetaValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Number(value)
    }
}

/// Descriptive attributes of a parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Meaning {
    /// Human-readable name.
    pub long_name: String,
    /// Units of measure.
    pub units: String,
}

/// A named column of values aligned to the frame index.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Column {
    /// Column key.
    pub name: String,
    /// Values, one per index entry.
    #[cfg_attr(feature = "serde", serde(with = "nan_as_null"))]
    pub values: Vec<f64>,
}

#[cfg(feature = "serde")]
mod nan_as_null {
    //! JSON has no NaN; missing values travel as `null`.

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        values
            .iter()
            .map(|v| (!v.is_nan()).then_some(*v))
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

impl Column {
    /// Creates a new column.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// True if this column holds QC flags.
    #[must_use]
    pub fn is_qc(&self) -> bool {
        self.name.ends_with(QC_SUFFIX)
    }
}

/// Timestamp-indexed table of parameters, QC flags and metadata.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WaterFrame {
    /// Dataset-level attributes.
    pub metadata: BTreeMap<String, MetaValue>,
    /// Per-parameter descriptive attributes.
    pub meaning: BTreeMap<String, Meaning>,
    pub(crate) index: Vec<NaiveDateTime>,
    pub(crate) columns: Vec<Column>,
}

impl WaterFrame {
    /// Creates an empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a frame from an index and columns.
    ///
    /// Rows are sorted by time; when a timestamp repeats, the first row wins.
    ///
    /// # Errors
    /// Returns `Error::LengthMismatch` if a column length differs from the
    /// index and `Error::DuplicateKey` if two columns share a name.
    pub fn from_columns(index: Vec<NaiveDateTime>, columns: Vec<Column>) -> Result<Self> {
        for (i, column) in columns.iter().enumerate() {
            if column.values.len() != index.len() {
                return Err(Error::LengthMismatch {
                    key: column.name.clone(),
                    expected: index.len(),
                    found: column.values.len(),
                });
            }
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::DuplicateKey(column.name.clone()));
            }
        }

        let mut order: Vec<usize> = (0..index.len()).collect();
        order.sort_by_key(|&i| index[i]);
        order.dedup_by_key(|i| index[*i]);

        let sorted_index = order.iter().map(|&i| index[i]).collect();
        let sorted_columns = columns
            .into_iter()
            .map(|c| Column {
                values: order.iter().map(|&i| c.values[i]).collect(),
                name: c.name,
            })
            .collect();

        Ok(Self {
            metadata: BTreeMap::new(),
            meaning: BTreeMap::new(),
            index: sorted_index,
            columns: sorted_columns,
        })
    }

    /// Checks the structural invariants of a frame built without
    /// `from_columns` (e.g. deserialized from a snapshot).
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        for (i, column) in self.columns.iter().enumerate() {
            if column.values.len() != self.index.len() {
                return Err(Error::LengthMismatch {
                    key: column.name.clone(),
                    expected: self.index.len(),
                    found: column.values.len(),
                });
            }
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::DuplicateKey(column.name.clone()));
            }
        }
        if self.index.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidRange {
                start: "index".to_string(),
                end: "not strictly increasing".to_string(),
            });
        }
        Ok(())
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if the frame has no rows and no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() && self.columns.is_empty()
    }

    /// The time index.
    #[must_use]
    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// All columns in insertion order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// All column keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// True if a column named `key` exists.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c.name == key)
    }

    /// Values of column `key`.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if the column does not exist.
    pub fn column(&self, key: &str) -> Result<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == key)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Mutable values of column `key`.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if the column does not exist.
    pub fn column_mut(&mut self, key: &str) -> Result<&mut [f64]> {
        self.columns
            .iter_mut()
            .find(|c| c.name == key)
            .map(|c| c.values.as_mut_slice())
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Inserts or replaces a column.
    ///
    /// # Errors
    /// Returns `Error::LengthMismatch` if `values` does not match the index.
    pub fn insert_column(&mut self, key: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let key = key.into();
        if values.len() != self.index.len() {
            return Err(Error::LengthMismatch {
                key,
                expected: self.index.len(),
                found: values.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == key) {
            Some(column) => column.values = values,
            None => self.columns.push(Column::new(key, values)),
        }
        Ok(())
    }

    /// Decoded QC flags of `parameter`.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if the QC column does not exist.
    pub fn flags(&self, parameter: &str) -> Result<Vec<Option<QcFlag>>> {
        Ok(self
            .column(&qc_key(parameter))?
            .iter()
            .map(|&v| QcFlag::from_f64(v))
            .collect())
    }

    /// Parameter keys: columns with a paired `_QC` column, excluding time
    /// and acoustic columns.
    #[must_use]
    pub fn parameters(&self) -> Vec<String> {
        self.keys()
            .filter(|key| !key.contains("TIME"))
            .filter(|key| !is_acoustic_key(key))
            .filter(|key| self.has_key(&qc_key(key)))
            .map(str::to_string)
            .collect()
    }

    /// True if the frame holds acoustic columns.
    #[must_use]
    pub fn has_acoustic_data(&self) -> bool {
        self.keys().any(is_acoustic_key)
    }

    /// First and last timestamps.
    #[must_use]
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((*self.index.first()?, *self.index.last()?))
    }

    /// Removes all rows, columns and metadata.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Appends `other` with an outer join on the time index.
    ///
    /// Where both frames hold a value for the same key and timestamp, the
    /// non-missing value of `other` wins. Metadata and meanings of `other`
    /// override existing entries.
    pub fn concat(&mut self, other: WaterFrame) {
        let WaterFrame {
            metadata,
            meaning,
            index: other_index,
            columns: other_columns,
        } = other;
        self.metadata.extend(metadata);
        self.meaning.extend(meaning);

        let mut merged: Vec<NaiveDateTime> =
            self.index.iter().chain(other_index.iter()).copied().collect();
        merged.sort_unstable();
        merged.dedup();

        let position = |t: &NaiveDateTime| match merged.binary_search(t) {
            Ok(i) | Err(i) => i,
        };
        let self_pos: Vec<usize> = self.index.iter().map(position).collect();
        let other_pos: Vec<usize> = other_index.iter().map(position).collect();
        let n = merged.len();

        let mut columns: Vec<Column> = self
            .columns
            .drain(..)
            .map(|c| {
                let mut values = vec![f64::NAN; n];
                for (&p, &v) in self_pos.iter().zip(&c.values) {
                    values[p] = v;
                }
                Column::new(c.name, values)
            })
            .collect();

        for column in other_columns {
            let target = if let Some(i) = columns.iter().position(|c| c.name == column.name) {
                i
            } else {
                columns.push(Column::new(column.name, vec![f64::NAN; n]));
                columns.len() - 1
            };
            let values = &mut columns[target].values;
            for (&p, &v) in other_pos.iter().zip(&column.values) {
                if !v.is_nan() {
                    values[p] = v;
                }
            }
        }

        self.index = merged;
        self.columns = columns;
    }

    /// Removes parameters together with their QC columns.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` without modifying the frame if any key
    /// is missing.
    pub fn drop<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<()> {
        if let Some(missing) = keys.iter().find(|k| !self.has_key(k.as_ref())) {
            return Err(Error::KeyNotFound(missing.as_ref().to_string()));
        }
        for key in keys {
            let key = key.as_ref();
            let qc = qc_key(key);
            self.columns.retain(|c| c.name != key && c.name != qc);
            self.meaning.remove(key);
        }
        Ok(())
    }

    /// Masks every observation of `parameters` whose flag is not in `flags`.
    ///
    /// Masked values and their flags become `NaN`. With `dropnan`, rows where
    /// any of the parameters is missing are removed afterwards.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` without modifying the frame if a
    /// parameter or its QC column is missing.
    pub fn use_only<S: AsRef<str>>(
        &mut self,
        parameters: &[S],
        flags: &[QcFlag],
        dropnan: bool,
    ) -> Result<()> {
        for parameter in parameters {
            let parameter = parameter.as_ref();
            self.column(parameter)?;
            self.column(&qc_key(parameter))?;
        }

        for parameter in parameters {
            let parameter = parameter.as_ref();
            let keep: Vec<bool> = self
                .flags(parameter)?
                .into_iter()
                .map(|flag| flag.is_some_and(|f| flags.contains(&f)))
                .collect();
            for key in [parameter.to_string(), qc_key(parameter)] {
                for (value, &k) in self.column_mut(&key)?.iter_mut().zip(&keep) {
                    if !k {
                        *value = f64::NAN;
                    }
                }
            }
        }

        if dropnan {
            let mut keep = vec![true; self.len()];
            for parameter in parameters {
                for (k, v) in keep.iter_mut().zip(self.column(parameter.as_ref())?) {
                    *k &= !v.is_nan();
                }
            }
            self.retain_rows(&keep);
        }
        Ok(())
    }

    /// Renames a parameter and its QC column.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if `old` is missing and
    /// `Error::DuplicateKey` if `new` (or its QC column) already exists.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        if !self.has_key(old) {
            return Err(Error::KeyNotFound(old.to_string()));
        }
        if self.has_key(new) || self.has_key(&qc_key(new)) {
            return Err(Error::DuplicateKey(new.to_string()));
        }
        let old_qc = qc_key(old);
        for column in &mut self.columns {
            if column.name == old {
                column.name = new.to_string();
            } else if column.name == old_qc {
                column.name = qc_key(new);
            }
        }
        if let Some(meaning) = self.meaning.remove(old) {
            self.meaning.insert(new.to_string(), meaning);
        }
        Ok(())
    }

    /// Keeps rows with `start <= time <= end`.
    ///
    /// # Errors
    /// Returns `Error::InvalidRange` if `start > end`.
    pub fn slice_time(&mut self, start: NaiveDateTime, end: NaiveDateTime) -> Result<()> {
        if start > end {
            return Err(Error::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        let keep: Vec<bool> = self.index.iter().map(|t| *t >= start && *t <= end).collect();
        self.retain_rows(&keep);
        Ok(())
    }

    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        let mut mask = keep.iter().copied();
        self.index.retain(|_| mask.next().unwrap_or(false));
        for column in &mut self.columns {
            let mut mask = keep.iter().copied();
            column.values.retain(|_| mask.next().unwrap_or(false));
        }
    }
}

impl fmt::Display for WaterFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows: {}", self.len())?;
        if let Some((start, end)) = self.time_range() {
            writeln!(f, "Time span: {start} - {end}")?;
        }
        writeln!(f, "Parameters: {}", self.parameters().join(", "))?;
        write!(
            f,
            "Columns: {}",
            self.keys().collect::<Vec<_>>().join(", ")
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 1, 27)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    pub(crate) fn temp_frame() -> WaterFrame {
        WaterFrame::from_columns(
            vec![hour(0), hour(1), hour(2), hour(3)],
            vec![
                Column::new("TEMP", vec![10.0, 11.0, f64::NAN, 13.0]),
                Column::new("TEMP_QC", vec![1.0, 4.0, 0.0, 0.0]),
                Column::new("PSAL", vec![38.0, 38.1, 38.2, 38.3]),
                Column::new("PSAL_QC", vec![0.0, 1.0, 2.0, 1.0]),
                Column::new("TIME_QC", vec![1.0, 1.0, 1.0, 1.0]),
                Column::new("DEPTH", vec![5.0, 5.0, 5.0, 5.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_parameters_excludes_time_and_unpaired() {
        let wf = WaterFrame::from_columns(
            vec![hour(0)],
            vec![
                Column::new("TEMP", vec![1.0]),
                Column::new("TEMP_QC", vec![0.0]),
                Column::new("TIME", vec![0.0]),
            ],
        )
        .unwrap();
        assert_eq!(wf.parameters(), vec!["TEMP".to_string()]);
    }

    #[test]
    fn test_from_columns_sorts_and_dedups() {
        let wf = WaterFrame::from_columns(
            vec![hour(2), hour(0), hour(2)],
            vec![Column::new("A", vec![2.0, 0.0, 9.0])],
        )
        .unwrap();
        assert_eq!(wf.index(), &[hour(0), hour(2)]);
        assert_eq!(wf.column("A").unwrap(), &[0.0, 2.0]);
    }

    #[test]
    fn test_from_columns_length_mismatch() {
        let err = WaterFrame::from_columns(vec![hour(0)], vec![Column::new("A", vec![])]);
        assert!(matches!(err, Err(Error::LengthMismatch { .. })));
    }

    #[test]
    fn test_concat_outer_join() {
        let mut a = WaterFrame::from_columns(
            vec![hour(0), hour(1)],
            vec![Column::new("TEMP", vec![1.0, 2.0])],
        )
        .unwrap();
        let mut b = WaterFrame::from_columns(
            vec![hour(1), hour(2)],
            vec![
                Column::new("TEMP", vec![f64::NAN, 3.0]),
                Column::new("PSAL", vec![38.0, 39.0]),
            ],
        )
        .unwrap();
        b.metadata.insert("site_code".into(), "OBSEA".into());

        a.concat(b);

        assert_eq!(a.len(), 3);
        assert_eq!(a.column("TEMP").unwrap(), &[1.0, 2.0, 3.0]);
        let psal = a.column("PSAL").unwrap();
        assert!(psal[0].is_nan());
        assert_eq!(&psal[1..], &[38.0, 39.0]);
        assert_eq!(a.metadata["site_code"], MetaValue::from("OBSEA"));
    }

    #[test]
    fn test_concat_into_empty() {
        let mut wf = WaterFrame::new();
        wf.concat(temp_frame());
        assert_eq!(wf, temp_frame());
    }

    #[test]
    fn test_drop_removes_qc_pair() {
        let mut wf = temp_frame();
        wf.drop(&["TEMP"]).unwrap();
        assert!(!wf.has_key("TEMP"));
        assert!(!wf.has_key("TEMP_QC"));
        assert!(wf.has_key("PSAL"));
    }

    #[test]
    fn test_drop_missing_key_is_atomic() {
        let mut wf = temp_frame();
        let err = wf.drop(&["TEMP", "CNDC"]).unwrap_err();
        assert_eq!(err, Error::KeyNotFound("CNDC".into()));
        assert!(wf.has_key("TEMP"));
    }

    #[test]
    fn test_use_only_good_flags_dropnan() {
        let mut wf = temp_frame();
        wf.use_only(&["TEMP"], &crate::GOOD_FLAGS, true).unwrap();
        // Row 1 (flag 4) masked, row 2 (NaN value) dropped with it.
        assert_eq!(wf.index(), &[hour(0), hour(3)]);
        assert_eq!(wf.column("TEMP").unwrap(), &[10.0, 13.0]);
        for flag in wf.flags("TEMP").unwrap() {
            assert!(flag.unwrap().is_good());
        }
    }

    #[test]
    fn test_use_only_without_dropnan_masks() {
        let mut wf = temp_frame();
        wf.use_only(&["PSAL"], &crate::GOOD_FLAGS, false).unwrap();
        assert_eq!(wf.len(), 4);
        let psal = wf.column("PSAL").unwrap();
        assert!(psal[2].is_nan());
        assert!(wf.column("PSAL_QC").unwrap()[2].is_nan());
    }

    #[test]
    fn test_rename_moves_qc_and_meaning() {
        let mut wf = temp_frame();
        wf.meaning.insert(
            "TEMP".into(),
            Meaning {
                long_name: "sea temperature".into(),
                units: "degC".into(),
            },
        );
        wf.rename("TEMP", "SST").unwrap();
        assert!(wf.has_key("SST"));
        assert!(wf.has_key("SST_QC"));
        assert!(!wf.has_key("TEMP"));
        assert!(wf.meaning.contains_key("SST"));
        assert!(wf.parameters().contains(&"SST".to_string()));
    }

    #[test]
    fn test_rename_conflicts() {
        let mut wf = temp_frame();
        assert_eq!(
            wf.rename("TEMP", "PSAL"),
            Err(Error::DuplicateKey("PSAL".into()))
        );
        assert_eq!(
            wf.rename("CNDC", "X"),
            Err(Error::KeyNotFound("CNDC".into()))
        );
    }

    #[test]
    fn test_slice_time() {
        let mut wf = temp_frame();
        wf.slice_time(hour(1), hour(2)).unwrap();
        assert_eq!(wf.index(), &[hour(1), hour(2)]);
        assert_eq!(wf.column("PSAL").unwrap(), &[38.1, 38.2]);
        assert!(wf.slice_time(hour(2), hour(1)).is_err());
    }

    #[test]
    fn test_acoustic_keys() {
        assert!(is_acoustic_key("Sequence"));
        assert!(is_acoustic_key("125.5"));
        assert!(!is_acoustic_key("TEMP"));
    }
}
