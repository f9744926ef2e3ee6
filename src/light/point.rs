//! Point light (omni-directional).

use super::{LightType, LightUniform};
use crate::math::Color;
use glam::Vec3;

/// Point light emitting in all directions from a position.
#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    /// Light color.
    pub color: Color,
    /// Light intensity.
    pub intensity: f32,
    /// Light position.
    pub position: Vec3,
    /// Distance at which the light reaches zero, 0 = infinite.
    pub distance: f32,
    /// Falloff exponent along `distance`.
    pub decay: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new(Color::WHITE, 1.0, 0.0, 2.0)
    }
}

impl PointLight {
    /// Create a new point light at the origin.
    pub fn new(color: Color, intensity: f32, distance: f32, decay: f32) -> Self {
        Self {
            color,
            intensity,
            position: Vec3::ZERO,
            distance,
            decay,
        }
    }

    /// Set the light position.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub(crate) fn to_uniform(&self) -> LightUniform {
        LightUniform {
            position: self.position.to_array(),
            light_type: LightType::Point as u32,
            color: self.color.to_array(),
            intensity: self.intensity,
            distance: self.distance,
            decay: self.decay,
            ..LightUniform::default()
        }
    }
}
