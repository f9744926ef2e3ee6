//! GPU layout of a material.

use super::Material;
use bytemuck::{Pod, Zeroable};

/// Material uniform data, bound per draw.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct MaterialUniform {
    /// Base color (rgb) and opacity (a).
    pub color: [f32; 4],
    /// Shading model index.
    pub shading: u32,
    /// 1 when a color map is bound.
    pub has_map: u32,
    /// Specular exponent.
    pub shininess: f32,
    /// Padding to 16 bytes.
    pub _pad: f32,
}

impl From<&Material> for MaterialUniform {
    fn from(material: &Material) -> Self {
        Self {
            color: material.color.to_rgba(material.effective_opacity()),
            shading: material.shading.index(),
            has_map: material.map.is_some() as u32,
            shininess: material.shininess,
            _pad: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Color;

    #[test]
    fn test_uniform_size_is_aligned() {
        assert_eq!(std::mem::size_of::<MaterialUniform>() % 16, 0);
        let u = MaterialUniform::from(&Material::basic(Color::YELLOW));
        assert_eq!(u.color, [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(u.shading, 0);
    }
}
