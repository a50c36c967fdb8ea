//! Axis-aligned slice rasterization
//!
//! A slice samples the field on the grid points of one plane and colors each
//! sample, producing an RGB8 image ready for texture upload.

use crate::parallel;
use crate::sampler;
use isovox_core::{ColorMap, ScalarField};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Axis perpendicular to the slice plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SliceAxis {
    X,
    Y,
    #[default]
    Z,
}

impl SliceAxis {
    /// Next axis in the Z -> Y -> X -> Z cycle
    pub fn next(self) -> Self {
        match self {
            SliceAxis::Z => SliceAxis::Y,
            SliceAxis::Y => SliceAxis::X,
            SliceAxis::X => SliceAxis::Z,
        }
    }

    /// Index of the axis in a coordinate triple
    pub fn index(self) -> usize {
        match self {
            SliceAxis::X => 0,
            SliceAxis::Y => 1,
            SliceAxis::Z => 2,
        }
    }

    /// Image width and height for a grid of the given dimensions
    ///
    /// Z slices are `nx x ny`, Y slices `nx x nz` and X slices `ny x nz`.
    pub fn image_size(self, dimensions: [usize; 3]) -> (usize, usize) {
        let [nx, ny, nz] = dimensions;
        match self {
            SliceAxis::Z => (nx, ny),
            SliceAxis::Y => (nx, nz),
            SliceAxis::X => (ny, nz),
        }
    }
}

impl fmt::Display for SliceAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SliceAxis::X => "x",
            SliceAxis::Y => "y",
            SliceAxis::Z => "z",
        };
        f.write_str(name)
    }
}

impl FromStr for SliceAxis {
    type Err = isovox_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(SliceAxis::X),
            "y" => Ok(SliceAxis::Y),
            "z" => Ok(SliceAxis::Z),
            other => Err(isovox_core::Error::InvalidData(format!(
                "Unknown slice axis '{}', expected x, y or z",
                other
            ))),
        }
    }
}

/// Configuration for slice rendering
#[derive(Debug, Clone, PartialEq)]
pub struct SliceConfig {
    /// Rasterize rows on the thread pool
    pub parallel: bool,
    pub colormap: ColorMap,
    /// Color range; the field's finite min/max when `None`
    pub value_range: Option<(f32, f32)>,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            colormap: ColorMap::Viridis,
            value_range: None,
        }
    }
}

impl SliceConfig {
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_colormap(mut self, colormap: ColorMap) -> Self {
        self.colormap = colormap;
        self
    }

    pub fn with_value_range(mut self, min_value: f32, max_value: f32) -> Self {
        self.value_range = Some((min_value, max_value));
        self
    }
}

/// Row-major RGB8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<[u8; 3]>,
}

impl SliceImage {
    /// Pixel at column `x`, row `y`
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    /// Interleaved `r, g, b` bytes
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }
}

/// Rasterize the plane at normalized `position` along `axis`
///
/// `position` is clamped into [0, 1] and maps to grid coordinate
/// `position * (n - 1)` on the slicing axis.
pub fn render_slice(
    field: &ScalarField<'_>,
    axis: SliceAxis,
    position: f32,
    config: &SliceConfig,
) -> SliceImage {
    let dimensions = field.dimensions();
    let (width, height) = axis.image_size(dimensions);
    let slice_coord = position.clamp(0.0, 1.0) * (dimensions[axis.index()] as f32 - 1.0);
    let (min_value, max_value) = config
        .value_range
        .or_else(|| field.range())
        .unwrap_or((0.0, 0.0));
    let colormap = config.colormap;

    let render_row = |v: usize| -> Vec<[u8; 3]> {
        (0..width)
            .map(|u| {
                let (u, v) = (u as f32, v as f32);
                let value = match axis {
                    SliceAxis::Z => sampler::sample_xyz(field, u, v, slice_coord),
                    SliceAxis::Y => sampler::sample_xyz(field, u, slice_coord, v),
                    SliceAxis::X => sampler::sample_xyz(field, slice_coord, u, v),
                };
                colormap.map(value, min_value, max_value).to_bytes()
            })
            .collect()
    };

    let rows: Vec<Vec<[u8; 3]>> = if config.parallel {
        parallel::parallel_map_range(height, render_row)
    } else {
        (0..height).map(render_row).collect()
    };

    log::trace!(
        "Rendered {} slice of '{}' at {}: {}x{}",
        axis,
        field.name(),
        slice_coord,
        width,
        height
    );

    SliceImage {
        width,
        height,
        pixels: rows.into_iter().flatten().collect(),
    }
}
