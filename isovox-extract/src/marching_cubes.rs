//! Marching Cubes isosurface extraction
//!
//! Every cell of the grid is classified against the isovalue, and the
//! topology tables in [`crate::tables`] turn the crossed edges into triangles.
//! Output vertices are in grid-index space: the cube at `(i, j, k)` spans
//! `[i, i + 1] x [j, j + 1] x [k, k + 1]`. Use [`IsoMesh::to_world`] to apply
//! spacing and origin.

use crate::parallel;
use crate::tables::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRI_END, TRI_TABLE};
use isovox_core::{ColorMap, IsoMesh, MeshVertex, Point3f, Rgb, ScalarField};
use serde::{Deserialize, Serialize};

/// Edge lengths in value space below this are treated as flat
/// How vertex colors are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    /// One color for the whole surface, taken from the isovalue
    #[default]
    Isovalue,
    /// Each vertex colored by the scalar interpolated along its edge
    Interpolated,
}

/// Configuration for Marching Cubes extraction
#[derive(Debug, Clone, PartialEq)]
pub struct MarchingCubesConfig {
    /// Split the grid into z slabs processed on the thread pool
    pub parallel: bool,
    pub color_mode: ColorMode,
    pub colormap: ColorMap,
    /// Color range; the field's finite min/max when `None`
    pub value_range: Option<(f32, f32)>,
}

impl Default for MarchingCubesConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            color_mode: ColorMode::Isovalue,
            colormap: ColorMap::Viridis,
            value_range: None,
        }
    }
}

impl MarchingCubesConfig {
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_color_mode(mut self, color_mode: ColorMode) -> Self {
        self.color_mode = color_mode;
        self
    }

    pub fn with_colormap(mut self, colormap: ColorMap) -> Self {
        self.colormap = colormap;
        self
    }

    /// Fix the color range instead of deriving it from the field
    pub fn with_value_range(mut self, min_value: f32, max_value: f32) -> Self {
        self.value_range = Some((min_value, max_value));
        self
    }
}

/// Per-extraction values shared by every cube
struct Extraction<'a> {
    field: ScalarField<'a>,
    isovalue: f32,
    range: (f32, f32),
    colormap: ColorMap,
    color_mode: ColorMode,
    /// Used for every vertex in [`ColorMode::Isovalue`]
    surface_color: Rgb,
}

/// Marching Cubes implementation
#[derive(Debug, Clone, Default)]
pub struct MarchingCubes {
    config: MarchingCubesConfig,
}

impl MarchingCubes {
    pub fn new(config: MarchingCubesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MarchingCubesConfig {
        &self.config
    }

    /// Extract the level set `field = isovalue` as a triangle soup
    ///
    /// Output is identical for serial and parallel runs: slabs are
    /// concatenated in increasing `k`, cubes within a slab in `j` then `i`
    /// order. An isovalue outside the field's range gives an empty mesh.
    pub fn extract(&self, field: &ScalarField<'_>, isovalue: f32) -> IsoMesh {
        let [nx, ny, nz] = field.dimensions();
        if nx < 2 || ny < 2 || nz < 2 {
            log::debug!("Grid {:?} has no complete cubes", field.dimensions());
            return IsoMesh::new();
        }

        let range = self
            .config
            .value_range
            .or_else(|| field.range())
            .unwrap_or((isovalue, isovalue));
        let extraction = Extraction {
            field: *field,
            isovalue,
            range,
            colormap: self.config.colormap,
            color_mode: self.config.color_mode,
            surface_color: self.config.colormap.map(isovalue, range.0, range.1),
        };

        let slabs = nz - 1;
        let slab_meshes: Vec<IsoMesh> = if self.config.parallel {
            parallel::parallel_map_range(slabs, |k| extraction.slab(k))
        } else {
            (0..slabs).map(|k| extraction.slab(k)).collect()
        };

        let triangles: usize = slab_meshes.iter().map(IsoMesh::triangle_count).sum();
        let mut mesh = IsoMesh::with_capacity(triangles);
        for slab in slab_meshes {
            mesh.append(slab);
        }

        log::debug!(
            "Marching cubes on '{}' at {}: {} cubes, {} triangles",
            field.name(),
            isovalue,
            (nx - 1) * (ny - 1) * slabs,
            mesh.triangle_count()
        );

        mesh
    }
}

impl Extraction<'_> {
    fn slab(&self, k: usize) -> IsoMesh {
        let [nx, ny, _] = self.field.dimensions();
        let mut mesh = IsoMesh::new();

        for j in 0..ny - 1 {
            for i in 0..nx - 1 {
                self.process_cube(i, j, k, &mut mesh);
            }
        }

        mesh
    }

    fn process_cube(&self, i: usize, j: usize, k: usize, mesh: &mut IsoMesh) {
        let values = self.field.values();
        let mut corner_values = [0.0f32; 8];
        let mut corner_positions = [Point3f::origin(); 8];

        for (c, [di, dj, dk]) in CORNER_OFFSETS.iter().enumerate() {
            let (ci, cj, ck) = (i + di, j + dj, k + dk);
            corner_values[c] = values[self.field.index(ci, cj, ck)];
            corner_positions[c] = Point3f::new(ci as f32, cj as f32, ck as f32);
        }

        let config = cube_configuration(&corner_values, self.isovalue);
        let crossed = EDGE_TABLE[config];
        if crossed == 0 {
            return;
        }

        let mut edge_vertices = [MeshVertex::new(Point3f::origin(), Rgb::BLACK); 12];
        for (edge, &[a, b]) in EDGE_CORNERS.iter().enumerate() {
            if crossed & (1 << edge) == 0 {
                continue;
            }

            let (position, value) = interpolate_edge(
                corner_positions[a],
                corner_positions[b],
                corner_values[a],
                corner_values[b],
                self.isovalue,
            );
            let color = match self.color_mode {
                ColorMode::Isovalue => self.surface_color,
                ColorMode::Interpolated => self.colormap.map(value, self.range.0, self.range.1),
            };
            edge_vertices[edge] = MeshVertex::new(position, color);
        }

        for triangle in TRI_TABLE[config].chunks_exact(3) {
            if triangle[0] == TRI_END {
                break;
            }
            mesh.push_triangle([
                edge_vertices[triangle[0] as usize],
                edge_vertices[triangle[1] as usize],
                edge_vertices[triangle[2] as usize],
            ]);
        }
    }
}

/// 8-bit configuration index: bit `c` is set when corner `c` is below `isovalue`
#[inline]
pub fn cube_configuration(corner_values: &[f32; 8], isovalue: f32) -> usize {
    corner_values
        .iter()
        .enumerate()
        .filter(|(_, &v)| v < isovalue)
        .fold(0, |config, (c, _)| config | (1 << c))
}

/// Point where the isosurface crosses the edge `p1 -> p2`, with the scalar there
///
/// The crossing parameter is clamped to the edge. When it is undefined (equal
/// endpoint values, or a NaN anywhere) the endpoint whose value is closer to
/// `isovalue` is returned. Ties go to `p1` and a NaN endpoint loses to a
/// finite one.
pub fn interpolate_edge(
    p1: Point3f,
    p2: Point3f,
    v1: f32,
    v2: f32,
    isovalue: f32,
) -> (Point3f, f32) {
    let t = (isovalue - v1) / (v2 - v1);
    if !t.is_finite() {
        let (d1, d2) = ((isovalue - v1).abs(), (isovalue - v2).abs());
        return if d2 < d1 || (d1.is_nan() && !d2.is_nan()) {
            (p2, v2)
        } else {
            (p1, v1)
        };
    }

    let t = t.clamp(0.0, 1.0);
    (p1 + (p2 - p1) * t, v1 + t * (v2 - v1))
}

/// Extract an isosurface with the default configuration
pub fn generate_surface(field: &ScalarField<'_>, isovalue: f32) -> IsoMesh {
    MarchingCubes::default().extract(field, isovalue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use isovox_core::{Vector3f, Volume};

    fn sphere_volume(size: usize) -> Volume {
        let c = (size - 1) as f32 / 2.0;
        Volume::from_fn([size; 3], [1.0; 3], Point3f::origin(), "distance", |i, j, k| {
            let d = Vector3f::new(i as f32 - c, j as f32 - c, k as f32 - c);
            d.magnitude()
        })
        .unwrap()
    }

    fn triangle_normal(triangle: &[MeshVertex]) -> Vector3f {
        let e1 = triangle[1].position - triangle[0].position;
        let e2 = triangle[2].position - triangle[0].position;
        e1.cross(&e2)
    }

    #[test]
    fn test_marching_cubes_config_default() {
        let config = MarchingCubesConfig::default();
        assert!(config.parallel);
        assert_eq!(config.color_mode, ColorMode::Isovalue);
        assert_eq!(config.colormap, ColorMap::Viridis);
        assert_eq!(config.value_range, None);

        let config = config.with_parallel(false).with_value_range(-1.0, 1.0);
        assert!(!config.parallel);
        assert_eq!(config.value_range, Some((-1.0, 1.0)));
    }

    #[test]
    fn test_two_layer_cube_gives_single_quad() {
        let values = [0.0, 0.0, 0.0, 0.0, 10.0, 10.0, 10.0, 10.0];
        let field = ScalarField::new("layers", &values, [2, 2, 2]).unwrap();

        let mesh = generate_surface(&field, 5.0);

        assert_eq!(mesh.triangle_count(), 2);
        for vertex in &mesh.vertices {
            assert_relative_eq!(vertex.position.z, 0.5);
        }
        // both triangles face the low-valued side
        for triangle in mesh.triangles() {
            let n = triangle_normal(triangle);
            assert!(n.z < 0.0);
            assert_relative_eq!(n.x, 0.0);
            assert_relative_eq!(n.y, 0.0);
        }
    }

    #[test]
    fn test_out_of_range_isovalue_is_empty() {
        let volume = sphere_volume(8);
        let field = volume.field("distance").unwrap();
        let (lo, hi) = field.range().unwrap();

        assert!(generate_surface(&field, lo - 0.1).is_empty());
        assert!(generate_surface(&field, hi + 0.1).is_empty());
        assert!(generate_surface(&field, f32::NAN).is_empty());
    }

    #[test]
    fn test_constant_field_is_empty() {
        let values = vec![3.0; 27];
        let field = ScalarField::new("flat", &values, [3, 3, 3]).unwrap();

        for iso in [-1.0, 2.999, 3.0, 3.001, 100.0] {
            assert!(generate_surface(&field, iso).is_empty(), "iso {}", iso);
        }
    }

    #[test]
    fn test_sphere_vertices_lie_on_sphere() {
        let size = 16;
        let radius = 5.0;
        let volume = sphere_volume(size);
        let field = volume.field("distance").unwrap();
        let center = Point3f::new(7.5, 7.5, 7.5);

        let mesh = generate_surface(&field, radius);

        assert!(mesh.triangle_count() > 100);
        assert_eq!(mesh.vertex_count() % 3, 0);
        for vertex in &mesh.vertices {
            let r = (vertex.position - center).magnitude();
            assert!((r - radius).abs() < 0.1, "vertex at radius {}", r);
        }

        // normals face the lower-valued side, here the center
        let inward = mesh
            .triangles()
            .filter(|t| {
                let centroid =
                    (t[0].position.coords + t[1].position.coords + t[2].position.coords) / 3.0;
                triangle_normal(t).dot(&(center.coords - centroid)) > 0.0
            })
            .count();
        assert_eq!(inward, mesh.triangle_count());
    }

    #[test]
    fn test_parallel_matches_serial() {
        let volume = sphere_volume(12);
        let field = volume.field("distance").unwrap();

        let serial = MarchingCubes::new(MarchingCubesConfig::default().with_parallel(false))
            .extract(&field, 4.0);
        let parallel = MarchingCubes::new(MarchingCubesConfig::default().with_parallel(true))
            .extract(&field, 4.0);

        assert!(!serial.is_empty());
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_repeated_extraction_is_deterministic() {
        let volume = sphere_volume(10);
        let field = volume.field("distance").unwrap();
        let mc = MarchingCubes::default();

        assert_eq!(mc.extract(&field, 3.0), mc.extract(&field, 3.0));
    }

    #[test]
    fn test_isovalue_coloring_is_uniform() {
        let volume = sphere_volume(10);
        let field = volume.field("distance").unwrap();
        let (lo, hi) = field.range().unwrap();

        let mesh = generate_surface(&field, 3.0);
        let expected = ColorMap::Viridis.map(3.0, lo, hi);
        assert!(mesh.vertices.iter().all(|v| v.color == expected));

        let mesh = MarchingCubes::new(
            MarchingCubesConfig::default()
                .with_colormap(ColorMap::CoolWarm)
                .with_value_range(2.0, 4.0),
        )
        .extract(&field, 3.0);
        assert!(mesh.vertices.iter().all(|v| v.color == Rgb::WHITE));
    }

    #[test]
    fn test_interpolated_coloring_tracks_isovalue() {
        let volume = sphere_volume(10);
        let field = volume.field("distance").unwrap();
        let config = MarchingCubesConfig::default()
            .with_color_mode(ColorMode::Interpolated)
            .with_value_range(0.0, 6.0);

        let mesh = MarchingCubes::new(config).extract(&field, 3.0);
        let expected = ColorMap::Viridis.map(3.0, 0.0, 6.0);
        for vertex in &mesh.vertices {
            assert!((vertex.color.g - expected.g).abs() < 1e-3);
        }
    }

    #[test]
    fn test_interpolate_edge() {
        let p1 = Point3f::new(0.0, 0.0, 0.0);
        let p2 = Point3f::new(1.0, 0.0, 0.0);

        let (p, v) = interpolate_edge(p1, p2, 0.0, 10.0, 2.5);
        assert_relative_eq!(p.x, 0.25);
        assert_relative_eq!(v, 2.5);

        let (p, _) = interpolate_edge(p1, p2, 10.0, 0.0, 2.5);
        assert_relative_eq!(p.x, 0.75);
    }

    #[test]
    fn test_degenerate_edge_picks_nearer_endpoint() {
        let p1 = Point3f::new(0.0, 0.0, 0.0);
        let p2 = Point3f::new(0.0, 1.0, 0.0);

        assert_eq!(interpolate_edge(p1, p2, 3.0, 3.0, 3.0), (p1, 3.0));
        assert_eq!(interpolate_edge(p1, p2, 3.0, 3.0, 7.0), (p1, 3.0));
        assert_eq!(interpolate_edge(p1, p2, f32::NAN, 2.0, 1.0), (p2, 2.0));
        assert_eq!(interpolate_edge(p1, p2, 2.0, f32::NAN, 1.0), (p1, 2.0));

        // an isovalue beyond both endpoints stays on the edge
        assert_eq!(interpolate_edge(p1, p2, 1.0, 1.0 + 5e-7, 10.0).0, p2);
        assert_eq!(interpolate_edge(p1, p2, 1.0, 1.0 + 5e-7, -10.0).0, p1);
    }

    #[test]
    fn test_small_magnitude_field_interpolates() {
        let values = [0.0, 0.0, 0.0, 0.0, 1e-7, 1e-7, 1e-7, 1e-7];
        let field = ScalarField::new("tiny", &values, [2, 2, 2]).unwrap();

        let mesh = generate_surface(&field, 5e-8);

        assert_eq!(mesh.triangle_count(), 2);
        for vertex in &mesh.vertices {
            assert_relative_eq!(vertex.position.z, 0.5, max_relative = 1e-4);
        }

        let p2 = Point3f::new(1.0, 0.0, 0.0);
        let (p, v) = interpolate_edge(Point3f::origin(), p2, 0.0, 4e-9, 1e-9);
        assert_relative_eq!(p.x, 0.25, max_relative = 1e-4);
        assert_relative_eq!(v, 1e-9, max_relative = 1e-4);
    }

    #[test]
    fn test_cube_configuration_bits() {
        let values = [0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        assert_eq!(cube_configuration(&values, 0.5), 0b1000_0101);
        assert_eq!(cube_configuration(&[0.5; 8], 0.5), 0);
        assert_eq!(cube_configuration(&[0.0; 8], 0.5), 255);
    }

    #[test]
    fn test_thin_grid_has_no_cubes() {
        let values = [0.0, 1.0, 2.0, 3.0];
        let field = ScalarField::new("sheet", &values, [2, 2, 1]).unwrap();
        assert!(generate_surface(&field, 1.5).is_empty());
    }
}
