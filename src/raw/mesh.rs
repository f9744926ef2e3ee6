//! Per-attribute vertex buffers and an optional u16 index buffer.

use super::DrawMode;
use std::collections::HashMap;
use wgpu::util::DeviceExt;

/// Data for one vertex attribute, one component count per variant.
#[derive(Debug, Clone, PartialEq)]
pub enum VertexAttribute {
    /// One float per vertex.
    Float(Vec<f32>),
    /// Two floats per vertex.
    Vec2(Vec<[f32; 2]>),
    /// Three floats per vertex.
    Vec3(Vec<[f32; 3]>),
    /// Four floats per vertex.
    Vec4(Vec<[f32; 4]>),
}

impl VertexAttribute {
    /// Components per vertex.
    pub fn stride(&self) -> usize {
        match self {
            VertexAttribute::Float(_) => 1,
            VertexAttribute::Vec2(_) => 2,
            VertexAttribute::Vec3(_) => 3,
            VertexAttribute::Vec4(_) => 4,
        }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        match self {
            VertexAttribute::Float(v) => v.len(),
            VertexAttribute::Vec2(v) => v.len(),
            VertexAttribute::Vec3(v) => v.len(),
            VertexAttribute::Vec4(v) => v.len(),
        }
    }

    /// Whether there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vertex format matching the stride.
    pub fn format(&self) -> wgpu::VertexFormat {
        match self {
            VertexAttribute::Float(_) => wgpu::VertexFormat::Float32,
            VertexAttribute::Vec2(_) => wgpu::VertexFormat::Float32x2,
            VertexAttribute::Vec3(_) => wgpu::VertexFormat::Float32x3,
            VertexAttribute::Vec4(_) => wgpu::VertexFormat::Float32x4,
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            VertexAttribute::Float(v) => bytemuck::cast_slice(v),
            VertexAttribute::Vec2(v) => bytemuck::cast_slice(v),
            VertexAttribute::Vec3(v) => bytemuck::cast_slice(v),
            VertexAttribute::Vec4(v) => bytemuck::cast_slice(v),
        }
    }
}

/// CPU-side mesh: named attributes bound to shader locations in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Attributes; the position in this list is the shader location.
    pub attributes: Vec<(&'static str, VertexAttribute)>,
    /// Triangle indices, or `None` to draw the vertex stream in order.
    pub indices: Option<Vec<u16>>,
}

impl MeshData {
    /// Number of vertices, taken as the shortest attribute.
    pub fn vertex_count(&self) -> usize {
        self.attributes.iter().map(|(_, a)| a.len()).min().unwrap_or(0)
    }

    /// Number of elements a draw call covers.
    pub fn element_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len(),
            None => self.vertex_count(),
        }
    }

    /// Attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|(n, _)| *n == name).map(|(_, a)| a)
    }

    /// Vertex sequence a draw call walks: the indices, or `0..n`.
    pub fn elements(&self) -> Vec<u16> {
        match &self.indices {
            Some(indices) => indices.clone(),
            None => (0..self.vertex_count() as u16).collect(),
        }
    }
}

struct IndexBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl IndexBuffer {
    fn new(device: &wgpu::Device, label: &str, indices: &[u16]) -> Self {
        // Buffer sizes must be a multiple of 4.
        let mut contents = indices.to_vec();
        if contents.len() % 2 == 1 {
            contents.push(0);
        }
        Self {
            buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&contents),
                usage: wgpu::BufferUsages::INDEX,
            }),
            count: indices.len() as u32,
        }
    }
}

struct AttributeBuffer {
    buffer: wgpu::Buffer,
    stride: u64,
    attribute: [wgpu::VertexAttribute; 1],
}

/// Mesh uploaded to the GPU, one vertex buffer per attribute.
pub struct RawMesh {
    label: String,
    buffers: Vec<AttributeBuffer>,
    index_buffer: Option<IndexBuffer>,
    elements: Vec<u16>,
    emulated: HashMap<DrawMode, IndexBuffer>,
    element_count: u32,
}

impl RawMesh {
    /// Upload every attribute and the index buffer.
    pub fn upload(device: &wgpu::Device, label: &str, data: &MeshData) -> Self {
        let buffers = data
            .attributes
            .iter()
            .enumerate()
            .map(|(location, (name, attribute))| AttributeBuffer {
                buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} {}", label, name)),
                    contents: attribute.bytes(),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                stride: (attribute.stride() * std::mem::size_of::<f32>()) as u64,
                attribute: [wgpu::VertexAttribute {
                    format: attribute.format(),
                    offset: 0,
                    shader_location: location as u32,
                }],
            })
            .collect();

        let index_buffer = data
            .indices
            .as_ref()
            .map(|indices| IndexBuffer::new(device, &format!("{} indices", label), indices));

        Self {
            label: label.to_owned(),
            buffers,
            index_buffer,
            elements: data.elements(),
            emulated: HashMap::new(),
            element_count: data.element_count() as u32,
        }
    }

    /// Build the index buffer `mode` needs, if it is emulated and not
    /// built yet.
    pub fn prepare(&mut self, device: &wgpu::Device, mode: DrawMode) {
        if self.emulated.contains_key(&mode) {
            return;
        }
        if let Some(indices) = mode.emulated_indices(&self.elements) {
            log::debug!("{}: {} as {} indices", self.label, mode, indices.len());
            let buffer = IndexBuffer::new(device, &format!("{} {}", self.label, mode), &indices);
            self.emulated.insert(mode, buffer);
        }
    }

    /// Vertex buffer layouts, one per attribute.
    pub fn layouts(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.buffers
            .iter()
            .map(|b| wgpu::VertexBufferLayout {
                array_stride: b.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &b.attribute,
            })
            .collect()
    }

    /// Whether draws in `mode` go through an index buffer.
    #[inline]
    pub fn is_indexed(&self, mode: DrawMode) -> bool {
        mode.is_emulated() || self.index_buffer.is_some()
    }

    /// Bind buffers and issue the draw call. Emulated modes draw nothing
    /// until [`RawMesh::prepare`] ran for them.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, mode: DrawMode) {
        for (slot, b) in self.buffers.iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, b.buffer.slice(..));
        }
        let indices = if mode.is_emulated() {
            match self.emulated.get(&mode) {
                Some(indices) => Some(indices),
                None => return,
            }
        } else {
            self.index_buffer.as_ref()
        };
        match indices {
            Some(indices) => {
                pass.set_index_buffer(indices.buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..indices.count, 0, 0..1);
            }
            None => pass.draw(0..self.element_count, 0..1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_follow_stride() {
        assert_eq!(VertexAttribute::Float(vec![0.0]).format(), wgpu::VertexFormat::Float32);
        assert_eq!(VertexAttribute::Vec2(vec![[0.0; 2]]).stride(), 2);
        assert_eq!(VertexAttribute::Vec4(vec![[0.0; 4]]).format(), wgpu::VertexFormat::Float32x4);
    }

    #[test]
    fn test_element_count_prefers_indices() {
        let mut data = MeshData {
            attributes: vec![("position", VertexAttribute::Vec3(vec![[0.0; 3]; 4]))],
            indices: None,
        };
        assert_eq!(data.element_count(), 4);
        data.indices = Some(vec![0, 2, 1, 1, 2, 3]);
        assert_eq!(data.element_count(), 6);
    }

    #[test]
    fn test_elements_walk_vertices_without_indices() {
        let mut data = MeshData {
            attributes: vec![("position", VertexAttribute::Vec3(vec![[0.0; 3]; 3]))],
            indices: None,
        };
        assert_eq!(data.elements(), vec![0, 1, 2]);
        data.indices = Some(vec![2, 1, 0]);
        assert_eq!(data.elements(), vec![2, 1, 0]);
    }
}
