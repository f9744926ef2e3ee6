//! Geometry module for vertex data and primitives.
//!
//! Shapes are built on the CPU into a [`Geometry`] so they can be raycast
//! and software-rasterized; [`Geometry::upload`] creates the GPU buffers.

mod box_geometry;
mod cylinder_geometry;
mod plane_geometry;
mod ring_geometry;
mod sphere_geometry;
mod vertex;

pub use box_geometry::BoxGeometry;
pub use cylinder_geometry::CylinderGeometry;
pub use plane_geometry::PlaneGeometry;
pub use ring_geometry::RingGeometry;
pub use sphere_geometry::SphereGeometry;
pub use vertex::{SkinVertex, Vertex};

use crate::core::Id;
use glam::{Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;

/// Indexed triangle mesh data.
#[derive(Debug, Clone)]
pub struct Geometry {
    id: Id,
    /// Vertex data.
    pub vertices: Vec<Vertex>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
    /// Joint influences, one per vertex, or empty for rigid meshes.
    pub skin: Vec<SkinVertex>,
}

impl Geometry {
    /// Create a geometry from vertices and triangle-list indices.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            id: Id::new(),
            vertices,
            indices,
            skin: Vec::new(),
        }
    }

    /// Attach joint influences. Ignored unless there is one per vertex.
    pub fn with_skin(mut self, skin: Vec<SkinVertex>) -> Self {
        if skin.len() == self.vertices.len() {
            self.skin = skin;
        } else {
            log::warn!(
                "skin has {} entries for {} vertices, mesh stays rigid",
                skin.len(),
                self.vertices.len()
            );
        }
        self
    }

    /// Whether the vertices carry joint influences.
    #[inline]
    pub fn is_skinned(&self) -> bool {
        !self.skin.is_empty()
    }

    /// Vertices deformed by linear-blend skinning.
    ///
    /// `joints[j]` maps bind-pose mesh space to posed mesh space for joint
    /// `j`. Influences naming a missing joint are skipped; a vertex with no
    /// remaining weight keeps its bind position.
    pub fn skinned_vertices(&self, joints: &[Mat4]) -> Vec<Vertex> {
        self.vertices
            .iter()
            .zip(&self.skin)
            .map(|(vertex, skin)| {
                let matrix = skin_matrix(skin, joints);
                let position = matrix * Vec3::from(vertex.position).extend(1.0);
                let normal = (matrix * Vec4::from((Vec3::from(vertex.normal), 0.0)))
                    .truncate()
                    .normalize_or_zero();
                Vertex::new(position.truncate().to_array(), normal.to_array(), vertex.uv)
            })
            .collect()
    }

    /// Unique ID, used as the GPU buffer cache key.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over triangles as position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            let a = self.vertices.get(tri[0] as usize)?;
            let b = self.vertices.get(tri[1] as usize)?;
            let c = self.vertices.get(tri[2] as usize)?;
            Some([
                Vec3::from(a.position),
                Vec3::from(b.position),
                Vec3::from(c.position),
            ])
        })
    }

    /// Create vertex and index buffers on the device.
    pub fn upload(&self, device: &wgpu::Device) -> GeometryBuffers {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Geometry Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Geometry Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let skin_buffer = self.is_skinned().then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Geometry Skin Buffer"),
                contents: bytemuck::cast_slice(&self.skin),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        GeometryBuffers {
            vertex_buffer,
            index_buffer,
            skin_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

fn skin_matrix(skin: &SkinVertex, joints: &[Mat4]) -> Mat4 {
    let mut matrix = Mat4::ZERO;
    let mut total = 0.0;
    for (&joint, &weight) in skin.joints.iter().zip(&skin.weights) {
        if weight <= 0.0 {
            continue;
        }
        if let Some(joint) = joints.get(joint as usize) {
            matrix += *joint * weight;
            total += weight;
        }
    }
    if total <= f32::EPSILON {
        Mat4::IDENTITY
    } else {
        matrix * total.recip()
    }
}

/// GPU buffers for a [`Geometry`].
pub struct GeometryBuffers {
    /// Vertex buffer.
    pub vertex_buffer: wgpu::Buffer,
    /// Index buffer (u32).
    pub index_buffer: wgpu::Buffer,
    /// Joint influences, for skinned geometry.
    pub skin_buffer: Option<wgpu::Buffer>,
    /// Number of indices.
    pub index_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> Geometry {
        Geometry::new(
            vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0; 2]),
                Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0; 2]),
                Vertex::new([0.0, 2.0, 0.0], [0.0, 0.0, 1.0], [0.0; 2]),
            ],
            vec![0, 1, 2],
        )
        .with_skin(vec![
            SkinVertex::new([0, 0, 0, 0], [1.0, 0.0, 0.0, 0.0]),
            SkinVertex::new([0, 1, 0, 0], [0.5, 0.5, 0.0, 0.0]),
            SkinVertex::new([1, 0, 0, 0], [1.0, 0.0, 0.0, 0.0]),
        ])
    }

    #[test]
    fn test_skinning_blends_joint_matrices() {
        let geometry = segment();
        assert!(geometry.is_skinned());
        let joints = [Mat4::IDENTITY, Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))];
        let skinned = geometry.skinned_vertices(&joints);
        assert_eq!(skinned[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(skinned[1].position, [1.0, 1.0, 0.0]);
        assert_eq!(skinned[2].position, [2.0, 2.0, 0.0]);
        assert_eq!(skinned[2].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_skinning_rotates_normals() {
        let geometry = segment();
        let turn = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let skinned = geometry.skinned_vertices(&[turn, turn]);
        let normal = Vec3::from(skinned[0].normal);
        assert!((normal - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_missing_joint_keeps_bind_position() {
        let geometry = segment();
        let skinned = geometry.skinned_vertices(&[]);
        assert_eq!(skinned[2].position, [0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_mismatched_skin_is_ignored() {
        let geometry = Geometry::new(segment().vertices, vec![0, 1, 2]).with_skin(vec![SkinVertex::default()]);
        assert!(!geometry.is_skinned());
    }
}
