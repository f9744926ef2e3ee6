//! Material module: surface appearance of meshes.
//!
//! A [`Material`] is plain data. The GPU renderer turns it into a
//! [`MaterialUniform`] and picks a pipeline variant from its blend and
//! culling state.

mod uniform;

pub use uniform::MaterialUniform;

use crate::math::Color;
use crate::texture::Image;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lighting model used to shade a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shading {
    /// Unlit, flat color.
    Basic,
    /// Diffuse only.
    Lambert,
    /// Diffuse plus Blinn-Phong specular.
    #[default]
    Phong,
    /// Physically-inspired diffuse/specular mix.
    Standard,
    /// Color is the view-space normal.
    Normal,
}

impl Shading {
    /// Index passed to the shader.
    pub fn index(self) -> u32 {
        match self {
            Shading::Basic => 0,
            Shading::Lambert => 1,
            Shading::Phong => 2,
            Shading::Standard => 3,
            Shading::Normal => 4,
        }
    }
}

/// Which faces are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Counter-clockwise faces only.
    #[default]
    Front,
    /// Clockwise faces only.
    Back,
    /// Both faces.
    Double,
}

impl Side {
    /// Face culled by the rasterizer.
    pub fn cull_mode(self) -> Option<wgpu::Face> {
        match self {
            Side::Front => Some(wgpu::Face::Back),
            Side::Back => Some(wgpu::Face::Front),
            Side::Double => None,
        }
    }
}

/// Surface description of a mesh.
#[derive(Debug, Clone)]
pub struct Material {
    /// Lighting model.
    pub shading: Shading,
    /// Base color.
    pub color: Color,
    /// Opacity, only honored when `transparent` is set.
    pub opacity: f32,
    /// Alpha-blend this surface.
    pub transparent: bool,
    /// Which faces are drawn.
    pub side: Side,
    /// Specular exponent for phong shading.
    pub shininess: f32,
    /// Color texture multiplied into the base color.
    pub map: Option<Arc<Image>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            shading: Shading::Phong,
            color: Color::WHITE,
            opacity: 1.0,
            transparent: false,
            side: Side::Front,
            shininess: 30.0,
            map: None,
        }
    }
}

impl Material {
    /// Unlit material.
    pub fn basic(color: Color) -> Self {
        Self { shading: Shading::Basic, color, ..Self::default() }
    }

    /// Diffuse-only material.
    pub fn lambert(color: Color) -> Self {
        Self { shading: Shading::Lambert, color, ..Self::default() }
    }

    /// Phong material.
    pub fn phong(color: Color) -> Self {
        Self { shading: Shading::Phong, color, ..Self::default() }
    }

    /// Standard material.
    pub fn standard(color: Color) -> Self {
        Self { shading: Shading::Standard, color, ..Self::default() }
    }

    /// Normal-visualizing material.
    pub fn normal() -> Self {
        Self { shading: Shading::Normal, ..Self::default() }
    }

    /// Set the color texture.
    pub fn with_map(mut self, map: Arc<Image>) -> Self {
        self.map = Some(map);
        self
    }

    /// Make the material transparent with the given opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.transparent = true;
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Set face visibility.
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Alpha used when blending.
    pub fn effective_opacity(&self) -> f32 {
        if self.transparent {
            self.opacity
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opacity_only_when_transparent() {
        let mut m = Material::standard(Color::WHITE);
        m.opacity = 0.25;
        assert_eq!(m.effective_opacity(), 1.0);
        let m = m.with_opacity(0.25);
        assert_eq!(m.effective_opacity(), 0.25);
    }

    #[test]
    fn test_side_cull_mode() {
        assert_eq!(Side::Front.cull_mode(), Some(wgpu::Face::Back));
        assert_eq!(Side::Double.cull_mode(), None);
    }
}
