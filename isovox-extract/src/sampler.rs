//! Trilinear sampling of scalar fields at fractional grid coordinates

use isovox_core::{Point3f, ScalarField};

/// Distance kept from the upper grid boundary, in cells
///
/// Clamping to `n - 1 - EDGE_SAFETY_MARGIN` keeps the upper corner index of
/// the interpolation cell inside the grid.
pub const EDGE_SAFETY_MARGIN: f32 = 1.001;

/// Lower corner index and fractional weight along one axis
#[inline]
fn axis_cell(coord: f32, size: usize) -> (usize, usize, f32) {
    let upper = size as f32 - EDGE_SAFETY_MARGIN;
    if size < 2 || coord.is_nan() || !(upper > 0.0) {
        return (0, 0, 0.0);
    }

    let c = coord.clamp(0.0, upper);
    let c0 = c.floor() as usize;
    (c0, (c0 + 1).min(size - 1), c - c0 as f32)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Interpolated value of `field` at grid coordinate `coord`
///
/// Coordinates outside the grid are clamped onto it, so sampling on or just
/// past the boundary returns the boundary value.
pub fn sample(field: &ScalarField<'_>, coord: Point3f) -> f32 {
    sample_xyz(field, coord.x, coord.y, coord.z)
}

pub fn sample_xyz(field: &ScalarField<'_>, x: f32, y: f32, z: f32) -> f32 {
    let [nx, ny, nz] = field.dimensions();
    let (x0, x1, xd) = axis_cell(x, nx);
    let (y0, y1, yd) = axis_cell(y, ny);
    let (z0, z1, zd) = axis_cell(z, nz);

    let values = field.values();
    let at = |i, j, k| values[field.index(i, j, k)];

    // along x
    let c00 = lerp(at(x0, y0, z0), at(x1, y0, z0), xd);
    let c01 = lerp(at(x0, y0, z1), at(x1, y0, z1), xd);
    let c10 = lerp(at(x0, y1, z0), at(x1, y1, z0), xd);
    let c11 = lerp(at(x0, y1, z1), at(x1, y1, z1), xd);

    // along y
    let c0 = lerp(c00, c10, yd);
    let c1 = lerp(c01, c11, yd);

    lerp(c0, c1, zd)
}
