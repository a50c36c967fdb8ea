//! Structured scalar volumes and borrowed scalar field views

use crate::error::{Error, Result};
use crate::point::{Point3f, Vector3f};

/// Grid point counts along x, y and z
pub type Dimensions = [usize; 3];

/// Flat index of grid point (i, j, k): z slowest, then y, x fastest
#[inline]
pub fn linear_index(dimensions: Dimensions, i: usize, j: usize, k: usize) -> usize {
    k * dimensions[0] * dimensions[1] + j * dimensions[0] + i
}

/// Total number of grid points for the given dimensions
///
/// Only valid for dimensions already accepted by [`Volume::new`]; use
/// [`checked_point_count`] on untrusted input.
#[inline]
pub fn point_count(dimensions: Dimensions) -> usize {
    dimensions[0] * dimensions[1] * dimensions[2]
}

/// Total number of grid points, `None` if the product overflows `usize`
pub fn checked_point_count(dimensions: Dimensions) -> Option<usize> {
    dimensions[0]
        .checked_mul(dimensions[1])?
        .checked_mul(dimensions[2])
}

#[derive(Debug, Clone, PartialEq)]
struct FieldData {
    name: String,
    values: Vec<f32>,
}

/// A regular 3D grid carrying one or more named scalar fields
///
/// Every field holds exactly `nx * ny * nz` values laid out with
/// [`linear_index`]. Fields keep their declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    dimensions: Dimensions,
    spacing: [f32; 3],
    origin: Point3f,
    fields: Vec<FieldData>,
}

impl Volume {
    /// Create an empty volume, validating dimensions and spacing
    pub fn new(dimensions: Dimensions, spacing: [f32; 3], origin: Point3f) -> Result<Self> {
        if dimensions.iter().any(|&n| n == 0) {
            return Err(Error::InvalidData(format!(
                "Grid dimensions must be positive, got {:?}",
                dimensions
            )));
        }
        if checked_point_count(dimensions).is_none() {
            return Err(Error::InvalidData(format!(
                "Grid dimensions {:?} overflow the point count",
                dimensions
            )));
        }
        if spacing.iter().any(|&s| !(s > 0.0) || !s.is_finite()) {
            return Err(Error::InvalidData(format!(
                "Grid spacing must be positive and finite, got {:?}",
                spacing
            )));
        }

        Ok(Self {
            dimensions,
            spacing,
            origin,
            fields: Vec::new(),
        })
    }

    /// Build a single-field volume by evaluating `f` at every grid point
    pub fn from_fn<F>(
        dimensions: Dimensions,
        spacing: [f32; 3],
        origin: Point3f,
        name: &str,
        f: F,
    ) -> Result<Self>
    where
        F: Fn(usize, usize, usize) -> f32,
    {
        let mut volume = Self::new(dimensions, spacing, origin)?;
        let mut values = Vec::with_capacity(point_count(dimensions));
        for k in 0..dimensions[2] {
            for j in 0..dimensions[1] {
                for i in 0..dimensions[0] {
                    values.push(f(i, j, k));
                }
            }
        }
        volume.add_field(name, values)?;
        Ok(volume)
    }

    /// Attach a named field; its length must match the grid and its name must be new
    pub fn add_field(&mut self, name: impl Into<String>, values: Vec<f32>) -> Result<()> {
        let name = name.into();
        let expected = self.point_count();
        if values.len() != expected {
            return Err(Error::InvalidData(format!(
                "Field '{}' has {} values but the grid has {} points",
                name,
                values.len(),
                expected
            )));
        }
        if self.has_field(&name) {
            return Err(Error::InvalidData(format!("Field '{}' already exists", name)));
        }

        self.fields.push(FieldData { name, values });
        Ok(())
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn spacing(&self) -> [f32; 3] {
        self.spacing
    }

    pub fn origin(&self) -> Point3f {
        self.origin
    }

    /// Number of grid points
    pub fn point_count(&self) -> usize {
        point_count(self.dimensions)
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// The first declared field, used when the caller names none
    pub fn first_field_name(&self) -> Option<&str> {
        self.fields.first().map(|f| f.name.as_str())
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Borrow a field by name
    pub fn field(&self, name: &str) -> Result<ScalarField<'_>> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| ScalarField {
                name: &f.name,
                values: &f.values,
                dimensions: self.dimensions,
            })
            .ok_or_else(|| Error::FieldNotFound(name.to_string()))
    }

    /// Borrow the named field, or the first field when no name is given or the
    /// name is unknown
    pub fn field_or_first(&self, name: Option<&str>) -> Result<ScalarField<'_>> {
        if let Some(name) = name {
            match self.field(name) {
                Ok(field) => return Ok(field),
                Err(Error::FieldNotFound(_)) if self.field_count() > 0 => {}
                Err(e) => return Err(e),
            }
        }

        let first = self
            .first_field_name()
            .ok_or_else(|| Error::FieldNotFound(name.unwrap_or("<first>").to_string()))?;
        self.field(first)
    }

    /// Physical position of grid point (i, j, k)
    pub fn grid_to_world(&self, i: usize, j: usize, k: usize) -> Point3f {
        Point3f::new(
            self.origin.x + i as f32 * self.spacing[0],
            self.origin.y + j as f32 * self.spacing[1],
            self.origin.z + k as f32 * self.spacing[2],
        )
    }

    /// Physical extent of the grid: `(dims - 1) * spacing` per axis
    pub fn physical_size(&self) -> Vector3f {
        Vector3f::new(
            (self.dimensions[0] - 1) as f32 * self.spacing[0],
            (self.dimensions[1] - 1) as f32 * self.spacing[1],
            (self.dimensions[2] - 1) as f32 * self.spacing[2],
        )
    }
}

/// Read-only view of one scalar field together with its grid dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarField<'a> {
    name: &'a str,
    values: &'a [f32],
    dimensions: Dimensions,
}

impl<'a> ScalarField<'a> {
    /// Wrap a raw value slice; the length must equal `nx * ny * nz`
    pub fn new(name: &'a str, values: &'a [f32], dimensions: Dimensions) -> Result<Self> {
        let expected = checked_point_count(dimensions).ok_or_else(|| {
            Error::InvalidData(format!("Field '{}' dimensions {:?} overflow", name, dimensions))
        })?;
        if values.len() != expected {
            return Err(Error::InvalidData(format!(
                "Field '{}' has {} values but dimensions {:?} need {}",
                name,
                values.len(),
                dimensions,
                expected
            )));
        }

        Ok(Self {
            name,
            values,
            dimensions,
        })
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn values(&self) -> &'a [f32] {
        self.values
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        linear_index(self.dimensions, i, j, k)
    }

    /// Value stored at grid point (i, j, k), `None` outside the grid
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<f32> {
        let [nx, ny, nz] = self.dimensions;
        if i < nx && j < ny && k < nz {
            Some(self.values[self.index(i, j, k)])
        } else {
            None
        }
    }

    /// Minimum and maximum over the finite values
    pub fn range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp_volume() -> Volume {
        let origin = Point3f::new(1.0, 0.0, -1.0);
        Volume::from_fn([3, 2, 2], [1.0, 2.0, 0.5], origin, "ramp", |i, j, k| {
            (i + 10 * j + 100 * k) as f32
        })
        .unwrap()
    }

    #[test]
    fn test_volume_creation() {
        let volume = Volume::new([4, 5, 6], [1.0, 1.0, 1.0], Point3f::origin()).unwrap();

        assert_eq!(volume.dimensions(), [4, 5, 6]);
        assert_eq!(volume.point_count(), 120);
        assert_eq!(volume.field_count(), 0);
        assert_eq!(volume.first_field_name(), None);
    }

    #[test]
    fn test_volume_rejects_bad_geometry() {
        assert!(Volume::new([0, 2, 2], [1.0, 1.0, 1.0], Point3f::origin()).is_err());
        assert!(Volume::new([2, 2, 2], [1.0, 0.0, 1.0], Point3f::origin()).is_err());
        assert!(Volume::new([2, 2, 2], [1.0, f32::NAN, 1.0], Point3f::origin()).is_err());
        assert!(Volume::new([usize::MAX, 2, 1], [1.0, 1.0, 1.0], Point3f::origin()).is_err());
    }

    #[test]
    fn test_z_major_layout() {
        let volume = ramp_volume();
        let field = volume.field("ramp").unwrap();

        assert_eq!(linear_index([3, 2, 2], 2, 1, 1), 1 * 6 + 1 * 3 + 2);
        assert_eq!(field.values()[0], 0.0);
        assert_eq!(field.values()[1], 1.0);
        assert_eq!(field.values()[3], 10.0);
        assert_eq!(field.values()[6], 100.0);
        assert_eq!(field.get(2, 1, 1), Some(112.0));
        assert_eq!(field.get(3, 0, 0), None);
    }

    #[test]
    fn test_checked_point_count() {
        assert_eq!(checked_point_count([4, 5, 6]), Some(120));
        assert_eq!(checked_point_count([usize::MAX / 2, 3, 1]), None);
        assert_eq!(checked_point_count([usize::MAX, 1, 1]), Some(usize::MAX));
    }

    #[test]
    fn test_field_validation() {
        let mut volume = Volume::new([2, 2, 2], [1.0, 1.0, 1.0], Point3f::origin()).unwrap();

        assert!(volume.add_field("short", vec![0.0; 7]).is_err());
        assert!(volume.add_field("temp", vec![0.0; 8]).is_ok());
        assert!(volume.add_field("temp", vec![1.0; 8]).is_err());
        assert!(ScalarField::new("raw", &[0.0; 9], [2, 2, 2]).is_err());
        assert!(ScalarField::new("raw", &[0.0; 4], [usize::MAX, 2, 2]).is_err());
    }

    #[test]
    fn test_field_lookup_and_fallback() {
        let mut volume = ramp_volume();
        volume.add_field("second", vec![1.0; 12]).unwrap();

        assert_eq!(volume.field_names(), vec!["ramp", "second"]);
        assert_eq!(volume.first_field_name(), Some("ramp"));
        assert!(matches!(volume.field("missing"), Err(Error::FieldNotFound(_))));
        assert_eq!(volume.field_or_first(Some("missing")).unwrap().name(), "ramp");
        assert_eq!(volume.field_or_first(Some("second")).unwrap().name(), "second");
        assert_eq!(volume.field_or_first(None).unwrap().name(), "ramp");
    }

    #[test]
    fn test_field_or_first_on_empty_volume() {
        let volume = Volume::new([2, 2, 2], [1.0, 1.0, 1.0], Point3f::origin()).unwrap();
        assert!(matches!(volume.field_or_first(None), Err(Error::FieldNotFound(_))));
    }

    #[test]
    fn test_field_range_ignores_non_finite() {
        let values = [3.0, f32::NAN, -2.0, 7.5, f32::INFINITY, 0.0, 1.0, 1.0];
        let field = ScalarField::new("t", &values, [2, 2, 2]).unwrap();
        assert_eq!(field.range(), Some((-2.0, 7.5)));

        let nans = [f32::NAN; 8];
        let field = ScalarField::new("n", &nans, [2, 2, 2]).unwrap();
        assert_eq!(field.range(), None);
    }

    #[test]
    fn test_grid_to_world_and_size() {
        let volume = ramp_volume();

        assert_eq!(volume.grid_to_world(2, 1, 1), Point3f::new(3.0, 2.0, -0.5));
        let size = volume.physical_size();
        assert_relative_eq!(size.x, 2.0);
        assert_relative_eq!(size.y, 2.0);
        assert_relative_eq!(size.z, 0.5);
    }
}
