//! JSON snapshots: the full frame (index, columns, metadata, meanings).

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use mooda_core::WaterFrame;

use crate::Result;

/// Reads a snapshot and checks the frame invariants.
///
/// # Errors
/// Returns an error if the file cannot be read, is not a snapshot, or
/// describes an inconsistent frame.
pub fn read_snapshot<P: AsRef<Path>>(path: P) -> Result<WaterFrame> {
    let reader = BufReader::new(File::open(path)?);
    let frame: WaterFrame = serde_json::from_reader(reader)?;
    frame.validate()?;
    Ok(frame)
}

/// Writes a snapshot.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_snapshot<P: AsRef<Path>>(frame: &WaterFrame, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, frame)?;
    writer.flush()?;
    Ok(())
}
