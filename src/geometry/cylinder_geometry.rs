//! Cylinder and cone geometry.

use super::{Geometry, Vertex};
use glam::Vec3;
use std::f32::consts::PI;

/// A cylinder along the Y axis, centered at the origin.
#[derive(Debug, Clone, Copy)]
pub struct CylinderGeometry {
    /// Top radius.
    pub radius_top: f32,
    /// Bottom radius.
    pub radius_bottom: f32,
    /// Height.
    pub height: f32,
    /// Radial segments.
    pub radial_segments: u32,
    /// Height segments.
    pub height_segments: u32,
    /// Open ended (no caps).
    pub open_ended: bool,
}

impl Default for CylinderGeometry {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 32)
    }
}

impl CylinderGeometry {
    /// Create a new cylinder geometry.
    pub fn new(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Self {
        Self {
            radius_top,
            radius_bottom,
            height,
            radial_segments: radial_segments.max(3),
            height_segments: 1,
            open_ended: false,
        }
    }

    /// Create a cone pointing along +Y.
    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Self {
        Self::new(0.0, radius, height, radial_segments)
    }

    /// Set open ended.
    pub fn with_open_ended(mut self, open_ended: bool) -> Self {
        self.open_ended = open_ended;
        self
    }

    /// Build the geometry.
    pub fn build(&self) -> Geometry {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let half_height = self.height / 2.0;

        self.build_torso(&mut vertices, &mut indices, half_height);

        if !self.open_ended {
            if self.radius_top > 0.0 {
                self.build_cap(&mut vertices, &mut indices, true, half_height);
            }
            if self.radius_bottom > 0.0 {
                self.build_cap(&mut vertices, &mut indices, false, half_height);
            }
        }

        Geometry::new(vertices, indices)
    }

    fn build_torso(&self, vertices: &mut Vec<Vertex>, indices: &mut Vec<u32>, half_height: f32) {
        let slope = (self.radius_bottom - self.radius_top) / self.height;
        let row = self.radial_segments + 1;
        let start = vertices.len() as u32;

        // Rows run top to bottom.
        for y in 0..=self.height_segments {
            let v = y as f32 / self.height_segments as f32;
            let radius = v * (self.radius_bottom - self.radius_top) + self.radius_top;
            let py = -v * self.height + half_height;

            for x in 0..=self.radial_segments {
                let u = x as f32 / self.radial_segments as f32;
                let theta = u * PI * 2.0;
                let (sin, cos) = theta.sin_cos();
                let normal = Vec3::new(sin, slope, cos).normalize();
                vertices.push(Vertex::new(
                    [radius * sin, py, radius * cos],
                    normal.to_array(),
                    [u, 1.0 - v],
                ));
            }
        }

        for x in 0..self.radial_segments {
            for y in 0..self.height_segments {
                let a = start + row * y + x;
                let b = start + row * (y + 1) + x;
                let c = start + row * (y + 1) + x + 1;
                let d = start + row * y + x + 1;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
    }

    fn build_cap(&self, vertices: &mut Vec<Vertex>, indices: &mut Vec<u32>, top: bool, half_height: f32) {
        let radius = if top { self.radius_top } else { self.radius_bottom };
        let sign = if top { 1.0 } else { -1.0 };
        let py = sign * half_height;
        let normal = [0.0, sign, 0.0];

        let center = vertices.len() as u32;
        vertices.push(Vertex::new([0.0, py, 0.0], normal, [0.5, 0.5]));

        let first = vertices.len() as u32;
        for x in 0..=self.radial_segments {
            let theta = x as f32 / self.radial_segments as f32 * PI * 2.0;
            let (sin, cos) = theta.sin_cos();
            vertices.push(Vertex::new(
                [radius * sin, py, radius * cos],
                normal,
                [cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5],
            ));
        }

        for x in 0..self.radial_segments {
            let i = first + x;
            if top {
                indices.extend_from_slice(&[i, i + 1, center]);
            } else {
                indices.extend_from_slice(&[i + 1, i, center]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cone_apex_points_up() {
        let g = CylinderGeometry::cone(0.1, 0.25, 32).build();
        let top = g
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::MIN, f32::max);
        assert!((top - 0.125).abs() < 1e-6);
        let apex_radius = g
            .vertices
            .iter()
            .filter(|v| v.position[1] > 0.1)
            .map(|v| Vec3::new(v.position[0], 0.0, v.position[2]).length())
            .fold(0.0, f32::max);
        assert!(apex_radius < 1e-6);
    }

    #[test]
    fn test_cylinder_winds_outward() {
        let g = CylinderGeometry::new(0.25, 0.25, 3.0, 16).build();
        for [a, b, c] in g.triangles() {
            let n = (b - a).cross(c - a);
            assert!(n.dot((a + b + c) / 3.0) > 0.0);
        }
    }
}
