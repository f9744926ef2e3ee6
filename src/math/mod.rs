//! # Math Module
//!
//! Vector, matrix and quaternion types come straight from `glam` and are
//! re-exported here. This module adds the pieces the demos need on top:
//! colors, rays and screen-space raycasting.

mod color;
mod ray;
mod raycaster;

pub use color::Color;
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4, EulerRot};
pub use ray::Ray;
pub use raycaster::{Intersection, Raycaster};

/// Common math constants and utilities.
pub mod consts {
    /// Pi constant.
    pub const PI: f32 = std::f32::consts::PI;
    /// Two times Pi.
    pub const TWO_PI: f32 = PI * 2.0;
    /// Half of Pi.
    pub const HALF_PI: f32 = PI / 2.0;
    /// Degrees to radians conversion factor.
    pub const DEG2RAD: f32 = PI / 180.0;
    /// Radians to degrees conversion factor.
    pub const RAD2DEG: f32 = 180.0 / PI;
    /// Small epsilon for floating point comparisons.
    pub const EPSILON: f32 = 1e-6;
}

/// Convert degrees to radians.
#[inline]
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees * consts::DEG2RAD
}

/// Convert radians to degrees.
#[inline]
pub fn rad_to_deg(radians: f32) -> f32 {
    radians * consts::RAD2DEG
}

/// Clamp a value between min and max.
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Linear interpolation between two values.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Rotation taking direction `from` onto direction `to`.
///
/// Axis is `from × to`, angle is `acos(from · to)`. The dot product is
/// clamped so rounding never produces NaN, and parallel inputs yield the
/// identity.
pub fn rotation_between(from: Vec3, to: Vec3) -> Quat {
    let axis = from.cross(to);
    let len = axis.length();
    if len < consts::EPSILON || !len.is_finite() {
        return Quat::IDENTITY;
    }
    let angle = from.dot(to).clamp(-1.0, 1.0).acos();
    Quat::from_axis_angle(axis / len, angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deg_to_rad() {
        assert!((deg_to_rad(180.0) - consts::PI).abs() < 1e-6);
        assert!((rad_to_deg(consts::HALF_PI) - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotation_between() {
        let q = rotation_between(Vec3::Y, Vec3::X);
        let rotated = q * Vec3::Y;
        assert!((rotated - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_rotation_between_parallel_is_identity() {
        assert_eq!(rotation_between(Vec3::Y, Vec3::Y), Quat::IDENTITY);
        let q = rotation_between(Vec3::Y, Vec3::Y * 1.0000001);
        assert!(q.is_finite());
    }
}
