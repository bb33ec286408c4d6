//! API payloads to `WaterFrame` conversion.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use mooda_core::{qc_key, Column, MetaValue, QcFlag, WaterFrame};
use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

const TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
];

/// One observation of a parameter.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub phenomenon_time: String,
    pub value: Value,
}

/// One row of an acoustic recording.
#[derive(Debug, Clone, Deserialize)]
pub struct AcousticRecord {
    pub time: String,
    /// `Sequence`, `Data Points` and one entry per frequency bin.
    pub values: BTreeMap<String, Value>,
}

/// Parses an API timestamp.
///
/// # Errors
/// Returns `Error::Decode` if no known layout matches.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let trimmed = text.trim().trim_end_matches('Z');
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(trimmed, f).ok())
        .ok_or_else(|| Error::Decode(format!("invalid timestamp: {text}")))
}

/// Converts a `YYYY-MM-DD` date into the `DD/MM/YYYY` form expected by
/// acoustic downloads.
///
/// # Errors
/// Returns `Error::InvalidDate` if `date` is not `YYYY-MM-DD`.
pub fn to_acoustic_date(date: &str) -> Result<String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%d/%m/%Y").to_string())
        .map_err(|_| Error::InvalidDate(date.to_string()))
}

/// Numeric value of a JSON cell; numbers and numeric strings are accepted,
/// anything else is missing.
#[must_use]
pub fn numeric(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Metadata value of a JSON cell.
#[must_use]
pub fn meta_value(value: &Value) -> MetaValue {
    match value {
        Value::Number(n) => n.as_f64().map_or_else(|| MetaValue::from(n.to_string()), MetaValue::Number),
        Value::String(s) => MetaValue::from(s.as_str()),
        other => MetaValue::from(other.to_string()),
    }
}

/// Builds a frame with `parameter` and its QC column (every flag
/// "no QC performed").
///
/// # Errors
/// Returns `Error::Decode` if a timestamp cannot be parsed.
pub fn observations_to_frame(parameter: &str, observations: &[Observation]) -> Result<WaterFrame> {
    let index = observations
        .iter()
        .map(|o| parse_timestamp(&o.phenomenon_time))
        .collect::<Result<Vec<_>>>()?;
    let values: Vec<f64> = observations.iter().map(|o| numeric(&o.value)).collect();
    let flags = vec![QcFlag::NO_QC.as_f64(); values.len()];
    Ok(WaterFrame::from_columns(
        index,
        vec![
            Column::new(parameter, values),
            Column::new(qc_key(parameter), flags),
        ],
    )?)
}

/// Builds a frame of acoustic columns. Keys missing from a row are
/// missing values.
///
/// # Errors
/// Returns `Error::Decode` if a timestamp cannot be parsed.
pub fn acoustic_to_frame(records: &[AcousticRecord]) -> Result<WaterFrame> {
    let index = records
        .iter()
        .map(|r| parse_timestamp(&r.time))
        .collect::<Result<Vec<_>>>()?;

    let mut keys: Vec<&String> = Vec::new();
    for record in records {
        for key in record.values.keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    let columns = keys
        .into_iter()
        .map(|key| {
            let values = records
                .iter()
                .map(|r| r.values.get(key).map_or(f64::NAN, numeric))
                .collect();
            Column::new(key.clone(), values)
        })
        .collect();
    Ok(WaterFrame::from_columns(index, columns)?)
}
