//! Box geometry.

use super::{Geometry, Vertex};
use glam::Vec3;

/// An axis-aligned box centered at the origin.
#[derive(Debug, Clone, Copy)]
pub struct BoxGeometry {
    /// Width (X).
    pub width: f32,
    /// Height (Y).
    pub height: f32,
    /// Depth (Z).
    pub depth: f32,
}

impl Default for BoxGeometry {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

impl BoxGeometry {
    /// Create a new box geometry.
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self { width, height, depth }
    }

    /// Create a cube.
    pub fn cube(size: f32) -> Self {
        Self::new(size, size, size)
    }

    /// Build the geometry: four vertices per face so each face keeps flat normals.
    pub fn build(&self) -> Geometry {
        let half = Vec3::new(self.width, self.height, self.depth) * 0.5;
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        // (normal, u axis, v axis) with u x v = normal
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        for (normal, u, v) in faces {
            let base = vertices.len() as u32;
            let center = normal * half;
            let hu = u * half;
            let hv = v * half;
            let corners = [
                (center - hu + hv, [0.0, 0.0]),
                (center + hu + hv, [1.0, 0.0]),
                (center - hu - hv, [0.0, 1.0]),
                (center + hu - hv, [1.0, 1.0]),
            ];
            for (p, uv) in corners {
                vertices.push(Vertex::new(p.to_array(), normal.to_array(), uv));
            }
            indices.extend_from_slice(&[base, base + 2, base + 1, base + 2, base + 3, base + 1]);
        }

        Geometry::new(vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_counts() {
        let g = BoxGeometry::new(6.0, 1.0, 6.0).build();
        assert_eq!(g.vertices.len(), 24);
        assert_eq!(g.triangle_count(), 12);
    }

    #[test]
    fn test_box_faces_wind_outward() {
        let g = BoxGeometry::cube(2.0).build();
        for [a, b, c] in g.triangles() {
            let n = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(n.dot(centroid) > 0.0);
        }
    }
}
