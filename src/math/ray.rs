//! Ray implementation for raycasting.

use glam::{Mat4, Vec3};

/// A ray with an origin and direction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Vec3,
    /// Direction of the ray (should be normalized).
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    #[inline]
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get a point at distance t along the ray.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to a plane given by a normal and a point on it.
    pub fn intersect_plane(&self, normal: Vec3, point: Vec3) -> Option<f32> {
        let denom = normal.dot(self.direction);
        if denom.abs() < 1e-8 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        (t >= 0.0).then_some(t)
    }

    /// Möller–Trumbore intersection with triangle `a b c`.
    ///
    /// Returns `(t, u, v)` where t is the distance along the ray and u, v
    /// are barycentric coordinates.
    pub fn intersect_triangle(
        &self,
        a: Vec3,
        b: Vec3,
        c: Vec3,
        backface_culling: bool,
    ) -> Option<(f32, f32, f32)> {
        let edge1 = b - a;
        let edge2 = c - a;
        let h = self.direction.cross(edge2);
        let det = edge1.dot(h);

        if backface_culling {
            if det < 1e-8 {
                return None;
            }
        } else if det.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / det;
        let s = self.origin - a;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * self.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        (t > 1e-8).then_some((t, u, v))
    }

    /// Apply a matrix transformation to this ray.
    pub fn apply_matrix4(&self, m: &Mat4) -> Self {
        Self {
            origin: m.transform_point3(self.origin),
            direction: m.transform_vector3(self.direction).normalize_or_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_triangle_hit() {
        let ray = Ray::new(Vec3::new(0.2, 0.2, 5.0), Vec3::NEG_Z);
        let hit = ray.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y, false);
        let (t, u, v) = hit.expect("ray should hit");
        assert!((t - 5.0).abs() < 1e-5);
        assert!((u - 0.2).abs() < 1e-5);
        assert!((v - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_intersect_triangle_backface() {
        let ray = Ray::new(Vec3::new(0.2, 0.2, -5.0), Vec3::Z);
        assert!(ray.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y, true).is_none());
        assert!(ray.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y, false).is_some());
    }

    #[test]
    fn test_intersect_plane() {
        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y);
        let t = ray.intersect_plane(Vec3::Y, Vec3::ZERO).unwrap();
        assert!((ray.at(t) - Vec3::ZERO).length() < 1e-6);
    }
}
