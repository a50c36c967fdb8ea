//! # isovox
//!
//! Structured scalar volume loading, slicing and isosurface extraction.
//!
//! This is the umbrella crate that ties the volume store, the VTK reader and
//! the extraction algorithms together behind a small set of functions. Use the
//! individual crates directly for finer control over dependencies.
//!
//! ## Quick Start
//!
//! ```rust
//! use isovox::prelude::*;
//!
//! let volume = Volume::from_fn([8, 8, 8], [1.0; 3], Point3f::origin(), "height", |_, _, k| {
//!     k as f32
//! })
//! .unwrap();
//!
//! let value = sample_field(&volume, "height", Point3f::new(1.0, 2.0, 3.5)).unwrap();
//! assert!((value - 3.5).abs() < 1e-5);
//!
//! let mesh = extract_isosurface(&volume, "height", 2.5);
//! assert_eq!(mesh.triangle_count(), 2 * 7 * 7);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables io and extract
//! - `io`: VTK structured-points reading and writing
//! - `extract`: Sampling, slicing and Marching Cubes
//! - `all`: Enables all features

// Re-export core functionality
pub use isovox_core::*;

// Re-export sub-crates
#[cfg(feature = "io")]
pub use isovox_io as io;

#[cfg(feature = "extract")]
pub use isovox_extract as extract;

/// Load a volume from a file, picking the format from its extension
#[cfg(feature = "io")]
pub fn load_volume<P: AsRef<std::path::Path>>(path: P) -> Result<Volume> {
    isovox_io::read_volume(path)
}

/// Field names in declaration order
pub fn list_fields(volume: &Volume) -> Vec<&str> {
    volume.field_names()
}

/// The first declared field, if any
pub fn first_field(volume: &Volume) -> Option<&str> {
    volume.first_field_name()
}

/// Trilinearly interpolated value of a named field at grid coordinate `coord`
#[cfg(feature = "extract")]
pub fn sample_field(volume: &Volume, field_name: &str, coord: Point3f) -> Result<f32> {
    let field = volume.field(field_name)?;
    Ok(isovox_extract::sample(&field, coord))
}

/// Isosurface of a named field in grid-index coordinates
///
/// Never fails: an unknown field name yields an empty mesh. Callers that want
/// the first field instead should resolve the name with [`first_field`].
#[cfg(feature = "extract")]
pub fn extract_isosurface(volume: &Volume, field_name: &str, isovalue: f32) -> IsoMesh {
    match volume.field(field_name) {
        Ok(field) => isovox_extract::generate_surface(&field, isovalue),
        Err(e) => {
            log::warn!("{}; returning an empty mesh", e);
            IsoMesh::new()
        }
    }
}

/// RGB8 slice through a named field at normalized `position` along `axis`
#[cfg(feature = "extract")]
pub fn slice_volume(
    volume: &Volume,
    field_name: &str,
    axis: isovox_extract::SliceAxis,
    position: f32,
) -> Result<isovox_extract::SliceImage> {
    let field = volume.field(field_name)?;
    Ok(isovox_extract::render_slice(
        &field,
        axis,
        position,
        &isovox_extract::SliceConfig::default(),
    ))
}

/// Convenient imports for common use cases
pub mod prelude {
    pub use isovox_core::*;

    pub use crate::{first_field, list_fields};

    #[cfg(feature = "io")]
    pub use crate::load_volume;

    #[cfg(feature = "io")]
    pub use isovox_io::{VolumeReader, VolumeWriter, VtkReader, VtkWriter};

    #[cfg(feature = "extract")]
    pub use crate::{extract_isosurface, sample_field, slice_volume};

    #[cfg(feature = "extract")]
    pub use isovox_extract::{
        ColorMode, MarchingCubes, MarchingCubesConfig, SliceAxis, SliceConfig, SliceImage,
    };
}
