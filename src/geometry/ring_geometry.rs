//! Flat ring (annulus) geometry, optionally a sector.

use super::{Geometry, Vertex};
use std::f32::consts::PI;

/// A ring in the XY plane facing +Z.
#[derive(Debug, Clone, Copy)]
pub struct RingGeometry {
    /// Inner radius.
    pub inner_radius: f32,
    /// Outer radius.
    pub outer_radius: f32,
    /// Segments around the ring.
    pub theta_segments: u32,
    /// Segments between inner and outer radius.
    pub phi_segments: u32,
    /// Start angle in radians.
    pub theta_start: f32,
    /// Sweep in radians.
    pub theta_length: f32,
}

impl Default for RingGeometry {
    fn default() -> Self {
        Self::new(0.5, 1.0, 32)
    }
}

impl RingGeometry {
    /// Create a full ring.
    pub fn new(inner_radius: f32, outer_radius: f32, theta_segments: u32) -> Self {
        Self {
            inner_radius,
            outer_radius,
            theta_segments: theta_segments.max(3),
            phi_segments: 1,
            theta_start: 0.0,
            theta_length: PI * 2.0,
        }
    }

    /// Restrict the ring to a sector.
    pub fn with_sector(mut self, theta_start: f32, theta_length: f32) -> Self {
        self.theta_start = theta_start;
        self.theta_length = theta_length;
        self
    }

    /// Set the radial subdivisions.
    pub fn with_phi_segments(mut self, phi_segments: u32) -> Self {
        self.phi_segments = phi_segments.max(1);
        self
    }

    /// Build the geometry.
    pub fn build(&self) -> Geometry {
        let ts = self.theta_segments;
        let step = (self.outer_radius - self.inner_radius) / self.phi_segments as f32;
        let mut vertices = Vec::with_capacity(((ts + 1) * (self.phi_segments + 1)) as usize);

        for j in 0..=self.phi_segments {
            let radius = self.inner_radius + step * j as f32;
            for i in 0..=ts {
                let segment = self.theta_start + i as f32 / ts as f32 * self.theta_length;
                let x = radius * segment.cos();
                let y = radius * segment.sin();
                vertices.push(Vertex::new(
                    [x, y, 0.0],
                    [0.0, 0.0, 1.0],
                    [
                        (x / self.outer_radius + 1.0) / 2.0,
                        (y / self.outer_radius + 1.0) / 2.0,
                    ],
                ));
            }
        }

        let mut indices = Vec::new();
        for j in 0..self.phi_segments {
            let level = j * (ts + 1);
            for i in 0..ts {
                let a = level + i;
                let b = a + ts + 1;
                let c = a + ts + 2;
                let d = a + 1;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Geometry::new(vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_sector_stays_inside_angle() {
        let g = RingGeometry::new(0.25, 2.0, 32)
            .with_phi_segments(32)
            .with_sector(PI / 2.0, PI / 6.0)
            .build();
        for v in &g.vertices {
            let p = Vec3::from(v.position);
            let angle = p.y.atan2(p.x);
            assert!(angle >= PI / 2.0 - 1e-5 && angle <= PI / 2.0 + PI / 6.0 + 1e-5);
            let r = p.length();
            assert!((0.25 - 1e-5..=2.0 + 1e-5).contains(&r));
        }
        for [a, b, c] in g.triangles() {
            assert!((b - a).cross(c - a).z > 0.0);
        }
    }
}
