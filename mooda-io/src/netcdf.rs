//! NetCDF-4 reader (OceanSITES style).
//!
//! NetCDF-4 files are HDF5 containers, so variables are read as HDF5
//! datasets. Every variable whose first dimension matches `TIME` becomes a
//! column; `_FillValue` cells become missing values; `long_name` and `units`
//! go into the frame meanings and global attributes into its metadata.

use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use hdf5::types::{FixedAscii, VarLenAscii, VarLenUnicode};
use hdf5::{Dataset, File, Location};
use mooda_core::{Column, Meaning, MetaValue, WaterFrame};

use crate::{Error, Result};

const TIME_NAMES: [&str; 2] = ["TIME", "time"];

/// Seconds per unit and epoch of a CF `"<unit> since <date>"` string.
fn parse_time_units(units: &str) -> Result<(f64, NaiveDateTime)> {
    let invalid = || Error::InvalidFormat(format!("unsupported time units: {units}"));
    let (unit, since) = units.split_once(" since ").ok_or_else(invalid)?;
    let seconds = match unit.trim().to_ascii_lowercase().as_str() {
        "days" | "day" => 86_400.0,
        "hours" | "hour" => 3_600.0,
        "minutes" | "minute" => 60.0,
        "seconds" | "second" | "s" => 1.0,
        _ => return Err(invalid()),
    };
    let since = since.trim().trim_end_matches('Z').trim_end_matches(" UTC");
    let epoch = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(since, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(since, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(invalid)?;
    Ok((seconds, epoch))
}

fn read_attr_opt<T: hdf5::H5Type + Clone>(loc: &Location, name: &str) -> Option<T> {
    loc.attr(name).ok()?.read_scalar::<T>().ok()
}

fn read_attr_opt_string(loc: &Location, name: &str) -> Option<String> {
    let attr = loc.attr(name).ok()?;
    if let Ok(value) = attr.read_scalar::<VarLenUnicode>() {
        return Some(value.to_string());
    }
    if let Ok(value) = attr.read_scalar::<VarLenAscii>() {
        return Some(value.to_string());
    }
    attr.read_scalar::<FixedAscii<1024>>()
        .ok()
        .map(|v| v.as_str().trim_end_matches('\0').to_string())
}

fn read_attr_meta(loc: &Location, name: &str) -> Option<MetaValue> {
    read_attr_opt_string(loc, name)
        .map(MetaValue::Text)
        .or_else(|| read_attr_opt::<f64>(loc, name).map(MetaValue::Number))
}

fn time_dataset(file: &File) -> Result<Dataset> {
    TIME_NAMES
        .iter()
        .find_map(|name| file.dataset(name).ok())
        .ok_or_else(|| Error::InvalidFormat("missing TIME variable".to_string()))
}

/// Reads an OceanSITES-style NetCDF-4 file.
///
/// # Errors
/// Returns `Error::InvalidFormat` if the file has no usable `TIME`
/// variable, and `Error::Hdf5` if the container cannot be read.
pub fn read_netcdf<P: AsRef<Path>>(path: P) -> Result<WaterFrame> {
    let file = File::open(path)?;
    let time = time_dataset(&file)?;
    let units = read_attr_opt_string(&time, "units")
        .unwrap_or_else(|| "days since 1950-01-01T00:00:00Z".to_string());
    let (unit_seconds, epoch) = parse_time_units(&units)?;

    let raw_time = time.read_raw::<f64>()?;
    let index: Vec<NaiveDateTime> = raw_time
        .iter()
        .map(|v| {
            #[allow(clippy::cast_possible_truncation)]
            let millis = (v * unit_seconds * 1000.0).round() as i64;
            epoch + Duration::milliseconds(millis)
        })
        .collect();
    let n = index.len();

    let mut columns = Vec::new();
    let mut meaning = Vec::new();
    for name in file.member_names()? {
        if TIME_NAMES.contains(&name.as_str()) {
            continue;
        }
        let Ok(dataset) = file.dataset(&name) else {
            continue;
        };
        if dataset.shape().first() != Some(&n) || dataset.size() != n {
            log::debug!("Skipping {name}: not aligned with TIME");
            continue;
        }
        let mut values = match dataset.read_raw::<f64>() {
            Ok(values) => values,
            Err(e) => {
                log::debug!("Skipping non-numeric variable {name}: {e}");
                continue;
            }
        };
        if let Some(fill) = read_attr_opt::<f64>(&dataset, "_FillValue") {
            #[allow(clippy::float_cmp)]
            values.iter_mut().filter(|v| **v == fill).for_each(|v| *v = f64::NAN);
        }
        let long_name = read_attr_opt_string(&dataset, "long_name");
        let units = read_attr_opt_string(&dataset, "units");
        if long_name.is_some() || units.is_some() {
            meaning.push((
                name.clone(),
                Meaning {
                    long_name: long_name.unwrap_or_default(),
                    units: units.unwrap_or_default(),
                },
            ));
        }
        columns.push(Column::new(name, values));
    }

    let mut frame = WaterFrame::from_columns(index, columns)?;
    frame.meaning.extend(meaning);
    for name in file.attr_names()? {
        match read_attr_meta(&file, &name) {
            Some(value) => {
                frame.metadata.insert(name, value);
            }
            None => log::debug!("Skipping global attribute {name}"),
        }
    }
    log::info!(
        "Read {} rows, {} columns from NetCDF",
        frame.len(),
        frame.columns().len()
    );
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdf5::Group;
    use ndarray::ArrayView1;
    use std::str::FromStr;
    use tempfile::NamedTempFile;

    fn write_var(group: &Group, name: &str, data: &[f64]) -> Dataset {
        let dataset = group
            .new_dataset::<f64>()
            .shape((data.len(),))
            .create(name)
            .unwrap();
        dataset.write(ArrayView1::from(data)).unwrap();
        dataset
    }

    fn write_str_attr(loc: &Location, name: &str, value: &str) {
        loc.new_attr::<VarLenUnicode>()
            .create(name)
            .unwrap()
            .write_scalar(&VarLenUnicode::from_str(value).unwrap())
            .unwrap();
    }

    #[test]
    fn test_time_units() {
        let (s, epoch) = parse_time_units("days since 1950-01-01T00:00:00Z").unwrap();
        assert!((s - 86_400.0).abs() < f64::EPSILON);
        assert_eq!(epoch.to_string(), "1950-01-01 00:00:00");
        assert!(parse_time_units("fortnights since 1950-01-01").is_err());
    }

    #[test]
    fn test_read_oceansites_file() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let file = File::create(tmp.path()).unwrap();
            write_str_attr(&file, "site_code", "OBSEA");
            file.new_attr::<f64>()
                .create("geospatial_vertical_max")
                .unwrap()
                .write_scalar(&20.0)
                .unwrap();

            let time = write_var(&file, "TIME", &[0.0, 1.0, 2.0]);
            write_str_attr(&time, "units", "hours since 2017-01-27 00:00:00");
            let temp = write_var(&file, "TEMP", &[13.0, 99_999.0, 13.4]);
            temp.new_attr::<f64>()
                .create("_FillValue")
                .unwrap()
                .write_scalar(&99_999.0)
                .unwrap();
            write_str_attr(&temp, "units", "degC");
            write_var(&file, "TEMP_QC", &[1.0, 9.0, 1.0]);
            write_var(&file, "DEPTH", &[20.0]);
        }

        let frame = read_netcdf(tmp.path()).unwrap();
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.index()[2].to_string(), "2017-01-27 02:00:00");
        assert!(frame.column("TEMP").unwrap()[1].is_nan());
        assert!(!frame.has_key("DEPTH"));
        assert_eq!(frame.parameters(), vec!["TEMP".to_string()]);
        assert_eq!(frame.meaning["TEMP"].units, "degC");
        assert_eq!(frame.metadata["site_code"], MetaValue::from("OBSEA"));
        assert_eq!(
            frame.metadata["geospatial_vertical_max"],
            MetaValue::Number(20.0)
        );
    }

    #[test]
    fn test_missing_time_variable() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let file = File::create(tmp.path()).unwrap();
            write_var(&file, "TEMP", &[1.0]);
        }
        assert!(matches!(
            read_netcdf(tmp.path()),
            Err(Error::InvalidFormat(_))
        ));
    }
}
