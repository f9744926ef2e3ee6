//! Texture module: decoded images and their GPU counterparts.

mod image;
mod sampler;
mod texture2d;

pub use self::image::Image;
pub use sampler::{AddressMode, FilterMode, SamplerDescriptor};
pub use texture2d::Texture2D;
