//! Triangle soup produced by isosurface extraction

use crate::point::{Point3f, Rgb};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A mesh vertex with position and color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshVertex {
    pub position: Point3f,
    pub color: Rgb,
}

impl MeshVertex {
    pub fn new(position: Point3f, color: Rgb) -> Self {
        Self { position, color }
    }
}

/// Vertex layout for uploading into a GPU vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// A non-indexed triangle mesh
///
/// Every three consecutive vertices form one triangle. Vertices shared between
/// triangles are duplicated; there is no index buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsoMesh {
    pub vertices: Vec<MeshVertex>,
}

impl IsoMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
        }
    }

    /// Create an empty mesh with room for `triangles` triangles
    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(triangles * 3),
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Append one triangle in winding order
    pub fn push_triangle(&mut self, triangle: [MeshVertex; 3]) {
        self.vertices.extend_from_slice(&triangle);
    }

    /// Append every triangle of `other`
    pub fn append(&mut self, other: IsoMesh) {
        self.vertices.extend(other.vertices);
    }

    /// Iterate over triangles as groups of three vertices
    pub fn triangles(&self) -> impl Iterator<Item = &[MeshVertex]> {
        self.vertices.chunks_exact(3)
    }

    /// Map grid-index positions into physical space
    pub fn to_world(&self, spacing: [f32; 3], origin: Point3f) -> IsoMesh {
        let vertices = self
            .vertices
            .iter()
            .map(|v| {
                MeshVertex::new(
                    Point3f::new(
                        origin.x + v.position.x * spacing[0],
                        origin.y + v.position.y * spacing[1],
                        origin.z + v.position.z * spacing[2],
                    ),
                    v.color,
                )
            })
            .collect();

        IsoMesh { vertices }
    }

    /// Flatten into the interleaved layout consumed by the renderer
    pub fn to_gpu_vertices(&self) -> Vec<GpuVertex> {
        self.vertices
            .iter()
            .map(|v| GpuVertex {
                position: [v.position.x, v.position.y, v.position.z],
                color: v.color.to_array(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle(color: Rgb) -> [MeshVertex; 3] {
        [
            MeshVertex::new(Point3f::new(0.0, 0.0, 0.0), color),
            MeshVertex::new(Point3f::new(1.0, 0.0, 0.0), color),
            MeshVertex::new(Point3f::new(0.0, 1.0, 0.5), color),
        ]
    }

    #[test]
    fn test_mesh_counts() {
        let mut mesh = IsoMesh::new();
        assert!(mesh.is_empty());

        mesh.push_triangle(unit_triangle(Rgb::WHITE));
        mesh.push_triangle(unit_triangle(Rgb::BLACK));

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.triangles().count(), 2);
        assert_eq!(mesh.triangles().nth(1).unwrap()[0].color, Rgb::BLACK);
    }

    #[test]
    fn test_to_world_scales_and_offsets() {
        let mut mesh = IsoMesh::new();
        mesh.push_triangle(unit_triangle(Rgb::WHITE));

        let world = mesh.to_world([2.0, 3.0, 4.0], Point3f::new(1.0, 1.0, 1.0));

        assert_eq!(world.vertices[0].position, Point3f::new(1.0, 1.0, 1.0));
        assert_eq!(world.vertices[1].position, Point3f::new(3.0, 1.0, 1.0));
        assert_eq!(world.vertices[2].position, Point3f::new(1.0, 4.0, 3.0));
        assert_eq!(world.vertices[2].color, Rgb::WHITE);
    }

    #[test]
    fn test_gpu_vertices_are_interleaved() {
        let mut mesh = IsoMesh::new();
        mesh.push_triangle(unit_triangle(Rgb::new(0.1, 0.2, 0.3)));

        let gpu = mesh.to_gpu_vertices();
        let floats: &[f32] = bytemuck::cast_slice(&gpu);

        assert_eq!(floats.len(), 18);
        assert_eq!(&floats[12..18], &[0.0, 1.0, 0.5, 0.1, 0.2, 0.3]);
    }
}
