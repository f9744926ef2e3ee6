//! # Ren demos
//!
//! A set of small browser 3D demos built on the Ren wgpu engine core:
//! an orbiting box tower, a stencil-masked electric fan, cones chasing
//! lights around the earth, a glTF fox walking to picked tiles, and two
//! raw-pipeline samples (a draw-mode pentagon and a texture crossfade).
//!
//! Every demo keeps its state on the CPU and hands the renderer either a
//! set of scenes plus an [`EffectComposer`](postprocessing::EffectComposer)
//! or a raw mesh frame; see [`demos::Demo`].
//!
//! ## Example
//!
//! ```ignore
//! use ren_demos::prelude::*;
//!
//! let demo = demos::load("fan", None).await?;
//! let ctx = Context::new(surface_target, 800, 600, &RenderConfig::default()).await?;
//! let mut app = App::new(ctx, demo).await?;
//! app.frame(now_seconds());
//! ```

#![warn(missing_docs)]

#[cfg(feature = "web")]
use wasm_bindgen::prelude::*;

pub mod math;
pub mod core;
pub mod scene;
pub mod geometry;
pub mod material;
pub mod camera;
pub mod texture;
pub mod light;
pub mod controls;
pub mod animation;
pub mod selection;
pub mod loaders;
pub mod postprocessing;
pub mod raster;
pub mod raw;
pub mod demos;
pub mod app;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::math::*;
    pub use crate::core::*;
    pub use crate::scene::*;
    pub use crate::geometry::*;
    pub use crate::material::*;
    pub use crate::camera::*;
    pub use crate::texture::*;
    pub use crate::light::*;
    pub use crate::controls::*;
    pub use crate::animation::*;
    pub use crate::postprocessing::*;
    pub use crate::raw::{DrawMode, MeshData, RawRenderer, RawUniforms};
    pub use crate::app::{App, Runner};
    pub use crate::demos::{self, Demo, Frame, Setup};
}

/// Install the panic hook and route `log` to the browser console.
#[cfg(feature = "web")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A second init from another module fails harmlessly.
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const NAME: &str = "Ren";
