//! UV sphere geometry.

use super::{Geometry, Vertex};
use glam::Vec3;
use std::f32::consts::PI;

/// A UV sphere centered at the origin.
#[derive(Debug, Clone, Copy)]
pub struct SphereGeometry {
    /// Radius.
    pub radius: f32,
    /// Horizontal segments.
    pub width_segments: u32,
    /// Vertical segments.
    pub height_segments: u32,
}

impl Default for SphereGeometry {
    fn default() -> Self {
        Self::new(1.0, 32, 16)
    }
}

impl SphereGeometry {
    /// Create a new sphere geometry.
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            radius,
            width_segments: width_segments.max(3),
            height_segments: height_segments.max(2),
        }
    }

    /// Build the geometry.
    pub fn build(&self) -> Geometry {
        let ws = self.width_segments;
        let hs = self.height_segments;
        let mut vertices = Vec::with_capacity(((ws + 1) * (hs + 1)) as usize);

        for iy in 0..=hs {
            let v = iy as f32 / hs as f32;
            let theta = v * PI;
            for ix in 0..=ws {
                let u = ix as f32 / ws as f32;
                let phi = u * PI * 2.0;
                let p = Vec3::new(
                    -self.radius * phi.cos() * theta.sin(),
                    self.radius * theta.cos(),
                    self.radius * phi.sin() * theta.sin(),
                );
                let n = p.normalize_or_zero();
                vertices.push(Vertex::new(p.to_array(), n.to_array(), [u, 1.0 - v]));
            }
        }

        let row = ws + 1;
        let mut indices = Vec::new();
        for iy in 0..hs {
            for ix in 0..ws {
                let a = row * iy + ix + 1;
                let b = row * iy + ix;
                let c = row * (iy + 1) + ix;
                let d = row * (iy + 1) + ix + 1;
                // Skip the degenerate triangles at the poles.
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != hs - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Geometry::new(vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_vertices_on_radius() {
        let g = SphereGeometry::new(3.0, 32, 32).build();
        assert_eq!(g.vertices.len(), 33 * 33);
        for v in &g.vertices {
            assert!((Vec3::from(v.position).length() - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_sphere_winds_outward() {
        let g = SphereGeometry::new(1.0, 12, 8).build();
        for [a, b, c] in g.triangles() {
            let n = (b - a).cross(c - a);
            assert!(n.dot((a + b + c) / 3.0) > 0.0);
        }
    }
}
