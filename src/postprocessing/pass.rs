//! Pass kinds and the render target interface they drive.

use crate::camera::PerspectiveCamera;
use crate::math::Color;
use crate::scene::Scene;

/// Stencil value written by a mask pass and tested by masked passes.
pub const MASK_REFERENCE: u8 = 1;

/// Index of a scene in the slice handed to [`super::EffectComposer::render`].
pub type SceneIndex = usize;

/// One step of a multi-pass frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pass {
    /// Clear color, depth and stencil.
    Clear {
        /// Clear color.
        color: Color,
    },
    /// Draw a scene. With `clear` the color (scene background or the
    /// composer clear color), depth and stencil buffers are cleared first.
    Render {
        /// Scene to draw.
        scene: SceneIndex,
        /// Clear before drawing.
        clear: bool,
    },
    /// Write a scene's silhouette into the stencil buffer without touching
    /// color or depth, then restrict following passes to it.
    Mask {
        /// Scene whose silhouette forms the mask.
        scene: SceneIndex,
        /// Restrict to everything outside the silhouette instead.
        inverse: bool,
    },
    /// Stop restricting passes to the stencil mask.
    ClearMask,
    /// Full-screen effect over the current color buffer.
    Effect(ScreenEffect),
}

impl Pass {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Pass::Clear { .. } => "clear",
            Pass::Render { .. } => "render",
            Pass::Mask { .. } => "mask",
            Pass::ClearMask => "clear-mask",
            Pass::Effect(effect) => effect.name(),
        }
    }
}

/// Full-screen color transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScreenEffect {
    /// Copy unchanged.
    Copy,
    /// Raise each channel to `1 / gamma`.
    GammaCorrection {
        /// Display gamma.
        gamma: f32,
    },
}

impl ScreenEffect {
    /// Standard display gamma correction.
    pub const GAMMA: Self = ScreenEffect::GammaCorrection { gamma: 2.2 };

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ScreenEffect::Copy => "copy",
            ScreenEffect::GammaCorrection { .. } => "gamma-correction",
        }
    }

    /// Apply the effect to one linear channel value.
    pub fn apply(&self, value: f32) -> f32 {
        match *self {
            ScreenEffect::Copy => value,
            ScreenEffect::GammaCorrection { gamma } => {
                if gamma > 0.0 {
                    value.max(0.0).powf(1.0 / gamma)
                } else {
                    value
                }
            }
        }
    }
}

/// Buffers to clear, with their clear values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClearFlags {
    /// Clear color, if the color buffer is cleared.
    pub color: Option<Color>,
    /// Reset depth to the far plane.
    pub depth: bool,
    /// Stencil clear value, if the stencil buffer is cleared.
    pub stencil: Option<u8>,
}

impl ClearFlags {
    /// Clear every buffer.
    pub fn all(color: Color) -> Self {
        Self {
            color: Some(color),
            depth: true,
            stencil: Some(0),
        }
    }

    /// Clear only the stencil buffer.
    pub fn stencil(value: u8) -> Self {
        Self {
            stencil: Some(value),
            ..Self::default()
        }
    }
}

/// How a draw interacts with the stencil buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StencilMode {
    /// No stencil test or write.
    #[default]
    Off,
    /// Write `value` wherever geometry covers, color and depth untouched.
    Write(u8),
    /// Only touch pixels whose stencil equals `value`.
    Test(u8),
}

/// Something the composer can draw into: the GPU renderer or the CPU
/// rasterizer.
pub trait FrameTarget {
    /// Clear the selected buffers.
    fn clear(&mut self, flags: ClearFlags);

    /// Draw every visible mesh of `scene` as seen from `camera`.
    fn draw_scene(&mut self, scene: &Scene, camera: &PerspectiveCamera, stencil: StencilMode);

    /// Run a full-screen effect over the color buffer. Only `Off` and
    /// `Test` stencil modes are meaningful here.
    fn apply_effect(&mut self, effect: ScreenEffect, stencil: StencilMode);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gamma_brightens_midtones() {
        let v = ScreenEffect::GAMMA.apply(0.5);
        assert!((v - 0.5f32.powf(1.0 / 2.2)).abs() < 1e-6);
        assert_eq!(ScreenEffect::GAMMA.apply(1.0), 1.0);
        assert_eq!(ScreenEffect::Copy.apply(0.25), 0.25);
    }
}
