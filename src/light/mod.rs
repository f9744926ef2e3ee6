//! Lighting module for scene illumination.

mod ambient;
mod directional;
mod point;
mod shadow;

pub use ambient::AmbientLight;
pub use directional::DirectionalLight;
pub use point::PointLight;
pub use shadow::{DirectionalShadow, ShadowView};

use crate::math::Color;
use bytemuck::{Pod, Zeroable};

/// Maximum number of directional and point lights shaded per draw.
pub const MAX_LIGHTS: usize = 8;

/// Light type identifier for GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LightType {
    /// Point light (omni-directional).
    Point = 0,
    /// Directional light (sun-like).
    Directional = 1,
}

/// A light placed in a scene.
#[derive(Debug, Clone)]
pub enum Light {
    /// Uniform light on every surface.
    Ambient(AmbientLight),
    /// Parallel rays from a direction.
    Directional(DirectionalLight),
    /// Light radiating from a point with distance falloff.
    Point(PointLight),
}

impl From<AmbientLight> for Light {
    fn from(light: AmbientLight) -> Self {
        Light::Ambient(light)
    }
}

impl From<DirectionalLight> for Light {
    fn from(light: DirectionalLight) -> Self {
        Light::Directional(light)
    }
}

impl From<PointLight> for Light {
    fn from(light: PointLight) -> Self {
        Light::Point(light)
    }
}

/// GPU-friendly light data structure (64 bytes).
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
pub struct LightUniform {
    /// Light position (point) or unit direction towards the light (directional).
    pub position: [f32; 3],
    /// Light type (0=point, 1=directional).
    pub light_type: u32,
    /// Light color.
    pub color: [f32; 3],
    /// Light intensity.
    pub intensity: f32,
    /// Cutoff distance, 0 = infinite.
    pub distance: f32,
    /// Falloff exponent.
    pub decay: f32,
    /// Padding to 16-byte alignment.
    pub _padding: [f32; 6],
}

/// All lights of a scene, packed for the GPU.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct LightsUniform {
    /// Summed ambient color (rgb), w unused.
    pub ambient: [f32; 4],
    /// Number of active entries in `lights`.
    pub num_lights: u32,
    /// Padding.
    pub _padding: [u32; 3],
    /// Directional and point lights.
    pub lights: [LightUniform; MAX_LIGHTS],
}

impl Default for LightsUniform {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl LightsUniform {
    /// Pack a list of lights. Ambient lights are summed; lights past
    /// [`MAX_LIGHTS`] are dropped with a warning.
    pub fn from_lights<'a>(lights: impl IntoIterator<Item = &'a Light>) -> Self {
        let mut uniform = Self::default();
        let mut ambient = Color::BLACK;
        let mut dropped = 0usize;

        for light in lights {
            let packed = match light {
                Light::Ambient(a) => {
                    let c = a.effective_color();
                    ambient = Color::new(ambient.r + c.r, ambient.g + c.g, ambient.b + c.b);
                    continue;
                }
                Light::Directional(d) => d.to_uniform(),
                Light::Point(p) => p.to_uniform(),
            };
            let n = uniform.num_lights as usize;
            if n < MAX_LIGHTS {
                uniform.lights[n] = packed;
                uniform.num_lights += 1;
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            log::warn!("{} lights exceed the limit of {} and are ignored", dropped, MAX_LIGHTS);
        }
        uniform.ambient = ambient.to_rgba(1.0);
        uniform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 64);
        assert_eq!(std::mem::size_of::<LightsUniform>() % 16, 0);
    }

    #[test]
    fn test_ambient_lights_are_summed() {
        let lights: Vec<Light> = vec![
            AmbientLight::new(Color::WHITE, 0.4).into(),
            AmbientLight::new(Color::WHITE, 0.1).into(),
            DirectionalLight::new(Color::WHITE, 1.0, Vec3::new(0.0, 10.0, 5.0)).into(),
        ];
        let u = LightsUniform::from_lights(&lights);
        assert!((u.ambient[0] - 0.5).abs() < 1e-6);
        assert_eq!(u.num_lights, 1);
        assert_eq!(u.lights[0].light_type, LightType::Directional as u32);
    }
}
