//! Plane geometry.

use super::{Geometry, Vertex};

/// A plane in the XY plane facing +Z.
#[derive(Debug, Clone, Copy)]
pub struct PlaneGeometry {
    /// Width (X).
    pub width: f32,
    /// Height (Y).
    pub height: f32,
    /// Segments along X.
    pub width_segments: u32,
    /// Segments along Y.
    pub height_segments: u32,
}

impl Default for PlaneGeometry {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl PlaneGeometry {
    /// Create a single-segment plane.
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_segments(width, height, 1, 1)
    }

    /// Create a plane with subdivisions.
    pub fn with_segments(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            width,
            height,
            width_segments: width_segments.max(1),
            height_segments: height_segments.max(1),
        }
    }

    /// Build the geometry.
    pub fn build(&self) -> Geometry {
        let gx = self.width_segments;
        let gy = self.height_segments;
        let seg_w = self.width / gx as f32;
        let seg_h = self.height / gy as f32;
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;

        let mut vertices = Vec::with_capacity(((gx + 1) * (gy + 1)) as usize);
        for iy in 0..=gy {
            let y = iy as f32 * seg_h - half_h;
            for ix in 0..=gx {
                let x = ix as f32 * seg_w - half_w;
                vertices.push(Vertex::new(
                    [x, -y, 0.0],
                    [0.0, 0.0, 1.0],
                    [ix as f32 / gx as f32, 1.0 - iy as f32 / gy as f32],
                ));
            }
        }

        let row = gx + 1;
        let mut indices = Vec::with_capacity((gx * gy * 6) as usize);
        for iy in 0..gy {
            for ix in 0..gx {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = (ix + 1) + row * (iy + 1);
                let d = (ix + 1) + row * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Geometry::new(vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_faces_positive_z() {
        let g = PlaneGeometry::new(4.2, 4.2).build();
        assert_eq!(g.vertices.len(), 4);
        assert_eq!(g.triangle_count(), 2);
        for [a, b, c] in g.triangles() {
            assert!((b - a).cross(c - a).z > 0.0);
        }
    }
}
