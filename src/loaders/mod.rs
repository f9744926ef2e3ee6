//! Asset loaders for models and textures.

mod gltf_loader;
mod loader;

pub use gltf_loader::*;
pub use loader::*;
