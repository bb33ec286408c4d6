//! CSV tables.
//!
//! Layout:
//! ```text
//! # site_code: OBSEA
//! # @TEMP.long_name: sea water temperature
//! # @TEMP.units: degC
//! TIME,TEMP,TEMP_QC
//! 2017-01-27T00:00:00,13.2,1
//! ```
//! Empty cells are missing values.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use mooda_core::{Column, MetaValue, WaterFrame};

use crate::{Error, Result};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_time(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim().trim_end_matches('Z');
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .ok_or_else(|| Error::InvalidFormat(format!("invalid timestamp: {text}")))
}

fn parse_meta_value(text: &str) -> MetaValue {
    text.parse::<f64>()
        .map_or_else(|_| MetaValue::from(text), MetaValue::Number)
}

fn apply_header_line(frame: &mut WaterFrame, line: &str) {
    let Some((key, value)) = line.split_once(':') else {
        log::debug!("Ignoring CSV comment: {line}");
        return;
    };
    let (key, value) = (key.trim(), value.trim());
    if let Some(rest) = key.strip_prefix('@') {
        if let Some((parameter, field)) = rest.rsplit_once('.') {
            let meaning = frame.meaning.entry(parameter.to_string()).or_default();
            match field {
                "long_name" => meaning.long_name = value.to_string(),
                "units" => meaning.units = value.to_string(),
                _ => log::debug!("Ignoring meaning field {field} of {parameter}"),
            }
        }
        return;
    }
    frame
        .metadata
        .insert(key.to_string(), parse_meta_value(value));
}

/// Reads a CSV table.
///
/// # Errors
/// Returns `Error::InvalidFormat` if the header has no time column or a
/// cell cannot be parsed.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<WaterFrame> {
    let text = fs::read_to_string(path)?;

    let mut header = WaterFrame::new();
    let mut body = String::with_capacity(text.len());
    for line in text.lines() {
        match line.strip_prefix('#') {
            Some(comment) => apply_header_line(&mut header, comment.trim()),
            None => {
                body.push_str(line);
                body.push('\n');
            }
        }
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let names: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let time_col = names
        .iter()
        .position(|n| n.eq_ignore_ascii_case("TIME"))
        .ok_or_else(|| Error::InvalidFormat("missing TIME column".to_string()))?;

    let mut index = Vec::new();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for record in reader.records() {
        let record = record?;
        for (i, cell) in record.iter().enumerate().take(names.len()) {
            if i == time_col {
                index.push(parse_time(cell)?);
            } else if cell.is_empty() {
                values[i].push(f64::NAN);
            } else {
                let value = cell.parse::<f64>().map_err(|_| {
                    Error::InvalidFormat(format!("invalid number in {}: {cell}", names[i]))
                })?;
                values[i].push(value);
            }
        }
    }

    let columns = names
        .into_iter()
        .zip(values)
        .enumerate()
        .filter(|(i, _)| *i != time_col)
        .map(|(_, (name, values))| Column::new(name, values))
        .collect();
    let mut frame = WaterFrame::from_columns(index, columns)?;
    frame.metadata = header.metadata;
    frame.meaning = header.meaning;
    log::debug!("Read {} rows from CSV", frame.len());
    Ok(frame)
}

/// Writes a CSV table.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_csv<P: AsRef<Path>>(frame: &WaterFrame, path: P) -> Result<()> {
    let mut file = fs::File::create(path)?;
    for (key, value) in &frame.metadata {
        writeln!(file, "# {key}: {value}")?;
    }
    for (parameter, meaning) in &frame.meaning {
        if !meaning.long_name.is_empty() {
            writeln!(file, "# @{parameter}.long_name: {}", meaning.long_name)?;
        }
        if !meaning.units.is_empty() {
            writeln!(file, "# @{parameter}.units: {}", meaning.units)?;
        }
    }

    let mut writer = csv::Writer::from_writer(file);
    let mut header = vec!["TIME".to_string()];
    header.extend(frame.keys().map(str::to_string));
    writer.write_record(&header)?;

    for (row, time) in frame.index().iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(time.format(TIME_FORMAT).to_string());
        for column in frame.columns() {
            let value = column.values[row];
            record.push(if value.is_nan() {
                String::new()
            } else {
                value.to_string()
            });
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mooda_core::Meaning;
    use tempfile::tempdir;

    fn sample() -> WaterFrame {
        let t = |h| {
            NaiveDate::from_ymd_opt(2017, 3, 1)
                .unwrap()
                .and_hms_opt(h, 30, 0)
                .unwrap()
        };
        let mut frame = WaterFrame::from_columns(
            vec![t(0), t(1)],
            vec![
                Column::new("TEMP", vec![13.25, f64::NAN]),
                Column::new("TEMP_QC", vec![1.0, 0.0]),
            ],
        )
        .unwrap();
        frame.metadata.insert("site_code".into(), "OBSEA".into());
        frame.metadata.insert("depth".into(), MetaValue::Number(20.0));
        frame.meaning.insert(
            "TEMP".into(),
            Meaning {
                long_name: "sea water temperature".into(),
                units: "degC".into(),
            },
        );
        frame
    }

    #[test]
    fn test_csv_preserves_metadata_and_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let frame = sample();
        write_csv(&frame, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# depth: 20\n# site_code: OBSEA\n"));
        assert!(text.contains("TIME,TEMP,TEMP_QC\n2017-03-01T00:30:00,13.25,1\n"));

        let read = read_csv(&path).unwrap();
        assert_eq!(read.index(), frame.index());
        assert!(read.column("TEMP").unwrap()[1].is_nan());
        assert_eq!(read.metadata["site_code"], MetaValue::from("OBSEA"));
        assert_eq!(read.meaning["TEMP"].units, "degC");
        assert_eq!(read.parameters(), vec!["TEMP".to_string()]);
    }

    #[test]
    fn test_csv_without_time_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "A,B\n1,2\n").unwrap();
        assert!(matches!(read_csv(&path), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_csv_bad_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "TIME,TEMP\n2017-01-27 10:00:00,warm\n").unwrap();
        assert!(matches!(read_csv(&path), Err(Error::InvalidFormat(_))));
    }
}
