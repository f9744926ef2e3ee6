//! # Demos
//!
//! Each demo owns its scenes, camera and animation state and runs entirely
//! on the CPU. The [`App`](crate::app::App) turns what a demo reports in
//! [`Demo::setup`] and [`Demo::frame`] into GPU work, so every demo can be
//! driven headless in tests.

mod crossfade;
mod fan;
mod fox;
mod globe;
mod tower;
mod triangle;

pub use crossfade::{Crossfade, CrossfadeConfig};
pub use fan::{Fan, FanConfig};
pub use fox::{Fox, FoxConfig};
pub use globe::{Globe, GlobeConfig, SwarmConfig};
pub use tower::{Tower, TowerConfig};
pub use triangle::{Triangle, TriangleConfig};

use crate::camera::PerspectiveCamera;
use crate::core::{Error, FrameTime, Result};
use crate::math::Color;
use crate::postprocessing::EffectComposer;
use crate::raw::{MeshData, PipelineState, RawUniforms};
use crate::scene::Scene;
use crate::texture::Image;
use glam::Vec2;
use std::sync::Arc;

/// How a demo wants to be rendered, decided once at startup.
#[derive(Debug, Clone)]
pub enum Setup {
    /// Scene graph rendered through an [`EffectComposer`].
    Scene {
        /// Clear color for passes without a scene background.
        clear_color: Color,
    },
    /// Hand-wired shader program over a single mesh.
    Raw(RawSetup),
}

/// Inputs for the raw pipeline.
#[derive(Debug, Clone)]
pub struct RawSetup {
    /// Label for GPU objects.
    pub label: &'static str,
    /// WGSL source of the vertex stage.
    pub vertex_shader: &'static str,
    /// WGSL source of the fragment stage.
    pub fragment_shader: &'static str,
    /// Vertex attributes and indices.
    pub mesh: MeshData,
    /// Color the frame is cleared to.
    pub clear_color: Color,
    /// Render into a centered square of side min(width, height).
    pub square_viewport: bool,
    /// Images bound to texture units in order.
    pub textures: Vec<Arc<Image>>,
}

/// Per-frame state of the raw pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFrame {
    /// Uniform block contents.
    pub uniforms: RawUniforms,
    /// Fixed-function state.
    pub state: PipelineState,
    /// Bind the loaded textures or black.
    pub textures_visible: bool,
}

/// What to draw this frame.
pub enum Frame<'a> {
    /// Run `composer` over `scenes` as seen from `camera`.
    Composed {
        /// Scenes referenced by index from the pass list.
        scenes: &'a [Scene],
        /// Pass list.
        composer: &'a EffectComposer,
        /// Viewpoint shared by every pass.
        camera: &'a PerspectiveCamera,
    },
    /// Draw the raw mesh once.
    Raw(RawFrame),
}

/// A self-contained interactive demo.
pub trait Demo {
    /// Short identifier, also used by the host to pick a demo.
    fn name(&self) -> &'static str;

    /// Rendering backend and its startup inputs.
    fn setup(&self) -> Setup;

    /// Advance animation to `time`.
    fn update(&mut self, time: FrameTime);

    /// Current frame description.
    fn frame(&self) -> Frame<'_>;

    /// Drawing surface changed size.
    fn resize(&mut self, width: u32, height: u32);

    /// Pointer moved, in normalized device coordinates.
    fn pointer_move(&mut self, _ndc: Vec2) {}

    /// Primary click, `now` on the clock driving [`Demo::update`].
    fn click(&mut self, _now: f64) {}

    /// Drag with the primary button held, in pixels.
    fn drag(&mut self, _dx: f32, _dy: f32) {}

    /// Wheel scrolled.
    fn wheel(&mut self, _delta: f32) {}

    /// Named UI action. Returns whether the demo knows the name.
    fn trigger(&mut self, _name: &str) -> bool {
        false
    }

    /// Value picked from the demo's select control.
    fn select(&mut self, _value: &str) -> Result<()> {
        Ok(())
    }

    /// Whether frames should currently be rendered.
    fn is_rendering(&self) -> bool {
        true
    }
}

/// Demo identifiers accepted by [`load`].
pub const NAMES: [&str; 7] = ["tower", "fan", "globe", "globe-triple", "fox", "triangle", "crossfade"];

/// Fetch a demo's assets and build it with its default configuration, or
/// with `config` (JSON) when given.
pub async fn load(name: &str, config: Option<&str>) -> Result<Box<dyn Demo>> {
    let demo: Box<dyn Demo> = match name {
        "tower" => Box::new(Tower::new(parse_or_default(config)?)),
        "fan" => Box::new(Fan::load(parse_or_default(config)?).await?),
        "globe" => Box::new(Globe::load(parse_or(config, GlobeConfig::single)?).await?),
        "globe-triple" => Box::new(Globe::load(parse_or(config, GlobeConfig::triple)?).await?),
        "fox" => Box::new(Fox::load(parse_or_default(config)?).await?),
        "triangle" => Box::new(Triangle::new(parse_or_default(config)?)),
        "crossfade" => Box::new(Crossfade::load(parse_or_default(config)?).await?),
        other => return Err(Error::UnknownDemo(other.to_owned())),
    };
    log::info!("demo '{}' ready", demo.name());
    Ok(demo)
}

fn parse_or_default<T>(json: Option<&str>) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    parse_or(json, T::default)
}

fn parse_or<T, F>(json: Option<&str>, fallback: F) -> Result<T>
where
    T: serde::de::DeserializeOwned,
    F: FnOnce() -> T,
{
    match json {
        Some(json) => Ok(serde_json::from_str(json)?),
        None => Ok(fallback()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Frame time at `elapsed` seconds after a 1/60 s step.
    pub fn at(elapsed: f64) -> FrameTime {
        FrameTime {
            elapsed,
            delta: 1.0 / 60.0,
        }
    }

    /// Run a `Composed` frame's composer against a software target.
    pub fn rasterize(demo: &dyn Demo, width: u32, height: u32) -> crate::raster::SoftwareTarget {
        let mut target = crate::raster::SoftwareTarget::new(width, height);
        match demo.frame() {
            Frame::Composed {
                scenes,
                composer,
                camera,
            } => composer.render(scenes, camera, &mut target).unwrap(),
            Frame::Raw(_) => panic!("{} is not a scene demo", demo.name()),
        }
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_default_uses_fallback_without_json() {
        let config: TowerConfig = parse_or_default(None).unwrap();
        assert_eq!(config, TowerConfig::default());
    }

    #[test]
    fn test_parse_overrides_single_field() {
        let config: TowerConfig = parse_or_default(Some(r#"{"rows": 5}"#)).unwrap();
        assert_eq!(config.rows, 5);
        assert_eq!(config.camera_position, TowerConfig::default().camera_position);
    }

    #[test]
    fn test_parse_rejects_bad_json() {
        let err = parse_or_default::<TowerConfig>(Some("{rows")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
