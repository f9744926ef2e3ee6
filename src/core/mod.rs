//! # Core Module
//!
//! GPU context management, the scene renderer, frame timing and the crate
//! error type.

mod clock;
mod context;
mod error;
mod id;
mod renderer;
mod shadow;

pub use clock::{Clock, FrameTime};
#[cfg(feature = "web")]
pub use clock::now_seconds;
pub use context::{Context, ContextError};
pub use error::{Error, Result};
pub use id::Id;
pub use renderer::{GpuFrame, RenderInfo, SceneRenderer, MAX_JOINTS};
pub use shadow::{ShadowMap, ShadowPass, SHADOW_FORMAT};

use crate::math::Color;

/// Render configuration options.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Enable stencil buffer.
    pub stencil: bool,
    /// Power preference for GPU selection.
    pub power_preference: wgpu::PowerPreference,
    /// Present mode (vsync).
    pub present_mode: wgpu::PresentMode,
    /// Clear color.
    pub clear_color: Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            stencil: true,
            power_preference: wgpu::PowerPreference::HighPerformance,
            present_mode: wgpu::PresentMode::AutoVsync,
            clear_color: Color::new(0.1, 0.1, 0.1),
        }
    }
}

impl RenderConfig {
    /// Config with a different clear color.
    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }
}
