//! Orbit controls for rotating camera around a target.

use crate::camera::PerspectiveCamera;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Orbit controls allowing camera rotation around a target point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitControls {
    /// Target point to orbit around.
    pub target: Vec3,
    /// Minimum distance from target.
    pub min_distance: f32,
    /// Maximum distance from target.
    pub max_distance: f32,
    /// Enable rotation.
    pub enable_rotate: bool,
    /// Enable panning.
    pub enable_pan: bool,
    /// Enable zooming.
    pub enable_zoom: bool,
    /// Rotation speed multiplier.
    pub rotate_speed: f32,
    /// Pan speed multiplier.
    pub pan_speed: f32,
    /// Zoom speed multiplier.
    pub zoom_speed: f32,
    #[serde(skip)]
    delta_theta: f32,
    #[serde(skip)]
    delta_phi: f32,
    #[serde(skip)]
    pan_offset: Vec3,
    #[serde(skip)]
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            min_distance: 0.1,
            max_distance: 1000.0,
            enable_rotate: true,
            enable_pan: true,
            enable_zoom: true,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    /// Create new orbit controls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create orbit controls with a distance range.
    pub fn with_distance(min_distance: f32, max_distance: f32) -> Self {
        Self {
            min_distance,
            max_distance,
            ..Self::default()
        }
    }

    /// Rotate the camera by delta angles (in radians).
    pub fn rotate(&mut self, delta_theta: f32, delta_phi: f32) {
        if self.enable_rotate {
            // Inverted for natural "grab and drag" feel
            self.delta_theta -= delta_theta * self.rotate_speed;
            self.delta_phi += delta_phi * self.rotate_speed;
        }
    }

    /// Rotate based on pointer movement (pixels).
    pub fn rotate_by_pixels(&mut self, delta_x: f32, delta_y: f32) {
        let rotate_scale = 0.004;
        self.rotate(delta_x * rotate_scale, delta_y * rotate_scale);
    }

    /// Pan the camera by pointer movement (pixels).
    pub fn pan(&mut self, delta_x: f32, delta_y: f32, camera: &PerspectiveCamera) {
        if !self.enable_pan {
            return;
        }

        let offset = camera.position - self.target;
        let distance = offset.length();

        // Half of the fov is center to top of screen
        let target_distance = distance * (camera.fov.to_radians() / 2.0).tan();
        let pan_x = delta_x * target_distance * self.pan_speed * 0.002;
        let pan_y = delta_y * target_distance * self.pan_speed * 0.002;

        let Some(forward) = (self.target - camera.position).try_normalize() else {
            return;
        };
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);

        self.pan_offset += right * -pan_x + up * pan_y;
    }

    /// Zoom in (positive) or out (negative).
    pub fn zoom(&mut self, delta: f32) {
        if !self.enable_zoom || !delta.is_finite() {
            return;
        }
        if delta > 0.0 {
            self.scale /= 1.0 + delta * self.zoom_speed * 0.1;
        } else {
            self.scale *= 1.0 - delta * self.zoom_speed * 0.1;
        }
    }

    /// Zoom by mouse wheel delta.
    pub fn zoom_by_wheel(&mut self, delta: f32) {
        // Scroll up (negative delta) zooms in
        self.zoom(-delta * 0.01);
    }

    /// Apply accumulated input to the camera.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        let offset = camera.position - self.target;
        let radius = offset.length().max(f32::EPSILON);
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).asin();

        theta += self.delta_theta;
        phi += self.delta_phi;
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;

        // Keep away from the poles
        phi = phi.clamp(-FRAC_PI_2 + 0.1, FRAC_PI_2 - 0.1);

        let new_radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.scale = 1.0;

        self.target += self.pan_offset;
        self.pan_offset = Vec3::ZERO;

        let new_offset = Vec3::new(
            new_radius * phi.cos() * theta.sin(),
            new_radius * phi.sin(),
            new_radius * phi.cos() * theta.cos(),
        );

        camera.set_position(self.target + new_offset);
        camera.look_at(self.target);
    }

    /// Drop pending input.
    pub fn reset(&mut self) {
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.pan_offset = Vec3::ZERO;
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(position: Vec3) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::default();
        camera.set_position(position);
        camera.look_at(Vec3::ZERO);
        camera
    }

    #[test]
    fn test_zoom_out_stops_at_max_distance() {
        let mut controls = OrbitControls::with_distance(1.0, 50.0);
        let mut camera = camera_at(Vec3::new(30.0, 0.0, 30.0));
        for _ in 0..50 {
            controls.zoom(-1.0);
            controls.update(&mut camera);
        }
        assert!((camera.position.length() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_in_stops_at_min_distance() {
        let mut controls = OrbitControls::with_distance(1.0, 10.0);
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 5.0));
        for _ in 0..100 {
            controls.zoom(1.0);
            controls.update(&mut camera);
        }
        assert!((camera.position.length() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_rotate_keeps_distance_and_target() {
        let mut controls = OrbitControls::new();
        let mut camera = camera_at(Vec3::new(0.0, 2.0, 10.0));
        let before = camera.position.length();
        controls.rotate_by_pixels(120.0, -40.0);
        controls.update(&mut camera);
        assert!((camera.position.length() - before).abs() < 1e-3);
        assert_eq!(camera.target, Vec3::ZERO);
    }
}
