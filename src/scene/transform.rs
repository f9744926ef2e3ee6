//! Transform component for scene objects.

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

/// Transform component containing position, rotation, and scale.
///
/// Rotation is held both as XYZ Euler angles and as a quaternion. Writing
/// either one keeps the other in sync, so code that accumulates an angle
/// (`rotation.z += step`) and code that composes quaternions can share an
/// object.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Local position.
    pub position: Vec3,
    /// Local rotation as XYZ Euler angles in radians.
    rotation: Vec3,
    /// Local rotation as quaternion.
    quaternion: Quat,
    /// Local scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// Create a new identity transform.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            quaternion: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Create a transform from position.
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::new() }
    }

    /// Create a transform from translation, rotation and scale.
    pub fn from_trs(position: Vec3, quaternion: Quat, scale: Vec3) -> Self {
        let mut t = Self { position, scale, ..Self::new() };
        t.set_quaternion(quaternion);
        t
    }

    /// Set position.
    #[inline]
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
    }

    /// Euler rotation (XYZ order).
    #[inline]
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Rotation quaternion.
    #[inline]
    pub fn quaternion(&self) -> Quat {
        self.quaternion
    }

    /// Set rotation from Euler angles.
    pub fn set_rotation(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Vec3::new(x, y, z);
        self.quaternion = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    /// Set rotation from quaternion.
    pub fn set_quaternion(&mut self, quaternion: Quat) {
        self.quaternion = quaternion.normalize();
        let (x, y, z) = self.quaternion.to_euler(EulerRot::XYZ);
        self.rotation = Vec3::new(x, y, z);
    }

    /// Rotate around the local X axis by accumulating the Euler angle.
    pub fn rotate_x(&mut self, angle: f32) {
        let r = self.rotation;
        self.set_rotation(r.x + angle, r.y, r.z);
    }

    /// Rotate around the local Y axis by accumulating the Euler angle.
    pub fn rotate_y(&mut self, angle: f32) {
        let r = self.rotation;
        self.set_rotation(r.x, r.y + angle, r.z);
    }

    /// Rotate around the local Z axis by accumulating the Euler angle.
    pub fn rotate_z(&mut self, angle: f32) {
        let r = self.rotation;
        self.set_rotation(r.x, r.y, r.z + angle);
    }

    /// Left-multiply `q` into the current orientation.
    pub fn premultiply(&mut self, q: Quat) {
        self.set_quaternion(q * self.quaternion);
    }

    /// Set uniform scale.
    #[inline]
    pub fn set_scale_uniform(&mut self, s: f32) {
        self.scale = Vec3::splat(s);
    }

    /// Orient the object so its local +Z axis points at `target`.
    ///
    /// Does nothing when the target coincides with the position.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let Some(forward) = (target - self.position).try_normalize() else {
            return;
        };
        let mut right = up.cross(forward);
        if right.length_squared() < 1e-12 {
            // Forward is parallel to up; nudge the basis.
            right = Vec3::X.cross(forward);
            if right.length_squared() < 1e-12 {
                right = Vec3::Z.cross(forward);
            }
        }
        let right = right.normalize();
        let true_up = forward.cross(right);
        let basis = Mat3::from_cols(right, true_up, forward);
        self.set_quaternion(Quat::from_mat3(&basis));
    }

    /// Local transformation matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quaternion, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_euler_and_quaternion_stay_in_sync() {
        let mut t = Transform::new();
        t.set_rotation(0.0, FRAC_PI_2, 0.0);
        let v = t.quaternion() * Vec3::Z;
        assert!((v - Vec3::X).length() < 1e-5);

        t.set_quaternion(Quat::from_rotation_y(0.5));
        assert!((t.rotation().y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_rotate_z_accumulates() {
        let mut t = Transform::new();
        for _ in 0..3 {
            t.rotate_z(0.3);
        }
        assert!((t.rotation().z - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_look_at_points_z_axis() {
        let mut t = Transform::from_position(Vec3::new(1.0, 0.0, 1.0));
        t.look_at(Vec3::new(4.0, 0.0, 5.0), Vec3::Y);
        let forward = t.quaternion() * Vec3::Z;
        assert!((forward - Vec3::new(0.6, 0.0, 0.8)).length() < 1e-5);
    }

    #[test]
    fn test_look_at_same_point_is_noop() {
        let mut t = Transform::from_position(Vec3::ONE);
        t.set_rotation(0.1, 0.2, 0.3);
        let before = t.quaternion();
        t.look_at(Vec3::ONE, Vec3::Y);
        assert_eq!(t.quaternion(), before);
    }

    #[test]
    fn test_premultiply_composes_on_the_left() {
        let mut t = Transform::new();
        t.set_quaternion(Quat::from_rotation_x(FRAC_PI_2));
        t.premultiply(Quat::from_rotation_y(FRAC_PI_2));
        let expected = Quat::from_rotation_y(FRAC_PI_2) * Quat::from_rotation_x(FRAC_PI_2);
        assert!(t.quaternion().abs_diff_eq(expected, 1e-5));
    }
}
