//! # Raw Pipeline
//!
//! Hand-wired rendering without the scene graph: a compiled
//! [`ShaderProgram`], one vertex buffer per attribute, an optional u16 index
//! buffer, a fixed uniform block and two texture units.

mod draw_mode;
mod mesh;
mod renderer;
mod shader;
mod shapes;

pub use draw_mode::{DrawMode, DrawModeError};
pub use mesh::{MeshData, RawMesh, VertexAttribute};
pub use renderer::{square_viewport, PipelineState, RawRenderer, RawUniforms, TEXTURE_UNITS};
pub use shader::{ShaderError, ShaderProgram, ShaderStage};
pub use shapes::{pentagon, plane};
