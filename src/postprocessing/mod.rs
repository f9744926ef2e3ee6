//! Multi-pass compositing.
//!
//! An [`EffectComposer`] holds an ordered list of [`Pass`]es (clear, render,
//! stencil mask, clear mask, full-screen effect) and replays them against a
//! [`FrameTarget`]. The GPU renderer and the software rasterizer both
//! implement the target, so pass ordering can be checked per pixel on the CPU.

mod effect_composer;
mod pass;
mod screen_pass;

pub use effect_composer::{ComposerError, EffectComposer};
pub use pass::{ClearFlags, FrameTarget, Pass, SceneIndex, ScreenEffect, StencilMode, MASK_REFERENCE};
pub use screen_pass::{FullscreenVertex, ScreenPass, ScreenStencil, FULLSCREEN_QUAD_VERTICES};
