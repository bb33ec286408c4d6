//! mooda-io: `WaterFrame` file I/O.
//!
//! Supported formats are chosen by file extension:
//! - `.nc`: NetCDF-4 (HDF5 container), read only, behind the `hdf5` feature
//! - `.csv`: comma-separated table with `#` metadata header lines
//! - `.json`: full-fidelity snapshot of a frame
//!
//! `.pkl` files are recognised but rejected with `Error::UnsupportedFormat`.
//!

mod error;
#[cfg(feature = "hdf5")]
pub mod netcdf;
pub mod snapshot;
pub mod table;

use std::fmt;
use std::path::Path;

use mooda_core::WaterFrame;

pub use error::{Error, Result};

/// File formats known to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    NetCdf,
    Csv,
    Snapshot,
    Pickle,
}

impl FileFormat {
    /// Detects the format from the file extension (case-insensitive).
    ///
    /// # Errors
    /// Returns `Error::UnsupportedFormat` for unknown or missing extensions.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "nc" => Ok(FileFormat::NetCdf),
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Snapshot),
            "pkl" => Ok(FileFormat::Pickle),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::NetCdf => "nc",
            FileFormat::Csv => "csv",
            FileFormat::Snapshot => "json",
            FileFormat::Pickle => "pkl",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileFormat::NetCdf => "NetCDF",
            FileFormat::Csv => "CSV",
            FileFormat::Snapshot => "Snapshot",
            FileFormat::Pickle => "Pickle",
        };
        f.write_str(name)
    }
}

/// Formats offered by open dialogs.
pub const OPEN_FORMATS: [FileFormat; 3] =
    [FileFormat::NetCdf, FileFormat::Snapshot, FileFormat::Csv];

/// Formats offered by save dialogs.
pub const SAVE_FORMATS: [FileFormat; 2] = [FileFormat::Snapshot, FileFormat::Csv];

/// Reads a frame from `path`.
///
/// # Errors
/// Returns `Error::UnsupportedFormat` for formats that cannot be read and
/// the underlying parse error otherwise.
pub fn open<P: AsRef<Path>>(path: P) -> Result<WaterFrame> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    log::info!("Opening {} as {format}", path.display());
    match format {
        #[cfg(feature = "hdf5")]
        FileFormat::NetCdf => netcdf::read_netcdf(path),
        FileFormat::Csv => table::read_csv(path),
        FileFormat::Snapshot => snapshot::read_snapshot(path),
        #[cfg(not(feature = "hdf5"))]
        FileFormat::NetCdf => Err(Error::UnsupportedFormat(path.display().to_string())),
        FileFormat::Pickle => Err(Error::UnsupportedFormat(path.display().to_string())),
    }
}

/// Writes `frame` to `path`.
///
/// # Errors
/// Returns `Error::UnsupportedFormat` for `.nc` and `.pkl`, and the
/// underlying write error otherwise.
pub fn save<P: AsRef<Path>>(frame: &WaterFrame, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    log::info!("Saving {} as {format}", path.display());
    match format {
        FileFormat::Csv => table::write_csv(frame, path),
        FileFormat::Snapshot => snapshot::write_snapshot(frame, path),
        FileFormat::NetCdf | FileFormat::Pickle => {
            Err(Error::UnsupportedFormat(path.display().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_path("a/b.NC").unwrap(), FileFormat::NetCdf);
        assert_eq!(FileFormat::from_path("x.csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_path("x.json").unwrap(), FileFormat::Snapshot);
        assert!(matches!(
            FileFormat::from_path("x.xlsx"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            FileFormat::from_path("noext"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_pickle_and_netcdf_save_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let frame = WaterFrame::new();
        assert!(matches!(
            save(&frame, dir.path().join("out.pkl")),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            save(&frame, dir.path().join("out.nc")),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            open(dir.path().join("in.pkl")),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
