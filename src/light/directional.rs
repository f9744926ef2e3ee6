//! Directional light.

use super::{DirectionalShadow, LightType, LightUniform};
use crate::math::Color;
use glam::Vec3;

/// Light arriving from `position` towards `target` with parallel rays.
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    /// Light color.
    pub color: Color,
    /// Light intensity.
    pub intensity: f32,
    /// Position the light shines from.
    pub position: Vec3,
    /// Point the light shines at.
    pub target: Vec3,
    /// Shadow camera, when the light casts shadows.
    pub shadow: Option<DirectionalShadow>,
}

impl DirectionalLight {
    /// Create a light shining from `position` at the origin.
    pub fn new(color: Color, intensity: f32, position: Vec3) -> Self {
        Self {
            color,
            intensity,
            position,
            target: Vec3::ZERO,
            shadow: None,
        }
    }

    /// Cast shadows through `shadow`.
    pub fn with_shadow(mut self, shadow: DirectionalShadow) -> Self {
        self.shadow = Some(shadow);
        self
    }

    /// Unit vector pointing from the surface towards the light.
    pub fn direction(&self) -> Vec3 {
        (self.position - self.target).try_normalize().unwrap_or(Vec3::Y)
    }

    pub(crate) fn to_uniform(&self) -> LightUniform {
        LightUniform {
            position: self.direction().to_array(),
            light_type: LightType::Directional as u32,
            color: self.color.to_array(),
            intensity: self.intensity,
            ..LightUniform::default()
        }
    }
}
