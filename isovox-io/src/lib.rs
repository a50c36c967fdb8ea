//! I/O operations for structured volumes
//!
//! This crate reads and writes legacy VTK structured-points files. Formats are
//! picked from the file extension.

pub mod vtk;

pub use vtk::{VtkReader, VtkWriter};

use isovox_core::{Error, Result, Volume};
use std::path::Path;

/// Trait for reading volumes from files
pub trait VolumeReader {
    fn read_volume<P: AsRef<Path>>(path: P) -> Result<Volume>;
}

/// Trait for writing volumes to files
pub trait VolumeWriter {
    fn write_volume<P: AsRef<Path>>(volume: &Volume, path: P) -> Result<()>;
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

/// Auto-detect format and read a volume
pub fn read_volume<P: AsRef<Path>>(path: P) -> Result<Volume> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("vtk") => VtkReader::read_volume(path),
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported volume format: {:?}",
            path.extension()
        ))),
    }
}

/// Auto-detect format and write a volume
pub fn write_volume<P: AsRef<Path>>(volume: &Volume, path: P) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("vtk") => VtkWriter::write_volume(volume, path),
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported volume format: {:?}",
            path.extension()
        ))),
    }
}
