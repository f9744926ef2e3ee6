//! GLTF/GLB model loader.

use super::{decode_image, LoadError};
use crate::animation::{AnimationClip, InterpolationMode, KeyframeTrack, TrackProperty, TrackValues};
use crate::geometry::{Geometry, SkinVertex, Vertex};
use crate::material::{Material, Side};
use crate::math::Color;
use crate::scene::{Object3D, ObjectId, Scene, Skeleton, Transform};
use crate::texture::Image;
use glam::{Mat4, Quat, Vec3};
use std::collections::HashMap;
use std::sync::Arc;

/// A mesh primitive with its material.
#[derive(Debug, Clone)]
pub struct LoadedMesh {
    /// Mesh name.
    pub name: String,
    /// Triangle geometry.
    pub geometry: Arc<Geometry>,
    /// Surface material.
    pub material: Material,
}

/// A node in the model hierarchy.
#[derive(Debug, Clone)]
pub struct LoadedNode {
    /// Node name.
    pub name: String,
    /// Local transform.
    pub transform: Transform,
    /// Mesh indices (references `LoadedModel::meshes`).
    pub meshes: Vec<usize>,
    /// Child node indices.
    pub children: Vec<usize>,
    /// Skin deforming this node's meshes (references `LoadedModel::skins`).
    pub skin: Option<usize>,
}

/// Joints and inverse bind matrices of a skin.
#[derive(Debug, Clone, Default)]
pub struct LoadedSkin {
    /// Joint node indices.
    pub joints: Vec<usize>,
    /// Inverse bind matrix per joint.
    pub inverse_bind: Vec<Mat4>,
}

/// A complete model loaded from a file.
#[derive(Debug, Clone, Default)]
pub struct LoadedModel {
    /// All mesh primitives.
    pub meshes: Vec<LoadedMesh>,
    /// All nodes, indexed like the file's node array.
    pub nodes: Vec<LoadedNode>,
    /// Root node indices.
    pub roots: Vec<usize>,
    /// Skins referenced by nodes.
    pub skins: Vec<LoadedSkin>,
    /// Animation clips; track targets are node indices.
    pub clips: Vec<Arc<AnimationClip>>,
}

impl LoadedModel {
    /// Total triangle count across all meshes.
    pub fn total_triangles(&self) -> usize {
        self.meshes.iter().map(|m| m.geometry.triangle_count()).sum()
    }

    /// Clip by name.
    pub fn clip(&self, name: &str) -> Option<&Arc<AnimationClip>> {
        self.clips.iter().find(|c| c.name == name)
    }

    /// Add the model to a scene under `parent` (or as a root).
    ///
    /// Returns the object created for each node, indexed like
    /// [`LoadedModel::nodes`], which is what [`crate::animation::Pose::apply`]
    /// expects.
    pub fn instantiate(&self, scene: &mut Scene, parent: Option<ObjectId>) -> Vec<ObjectId> {
        let materials: Vec<_> = self
            .meshes
            .iter()
            .map(|mesh| scene.add_material(mesh.material.clone()))
            .collect();

        let mut objects: Vec<Option<ObjectId>> = vec![None; self.nodes.len()];
        let mut skinned: Vec<(ObjectId, usize)> = Vec::new();
        let mut stack: Vec<(usize, Option<ObjectId>)> = self.roots.iter().rev().map(|&root| (root, parent)).collect();
        while let Some((index, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            if objects[index].is_some() {
                continue;
            }
            let mut object = Object3D::group().with_name(node.name.clone());
            object.transform = node.transform.clone();
            let id = match parent {
                Some(parent) => scene.add_child(parent, object),
                None => scene.add(object),
            };
            objects[index] = Some(id);

            for &mesh_index in &node.meshes {
                if let (Some(mesh), Some(&material)) = (self.meshes.get(mesh_index), materials.get(mesh_index)) {
                    let child = Object3D::mesh(mesh.geometry.clone(), material).with_name(mesh.name.clone());
                    let child = scene.add_child(id, child);
                    if let Some(skin) = node.skin {
                        skinned.push((child, skin));
                    }
                }
            }
            stack.extend(node.children.iter().rev().map(|&child| (child, Some(id))));
        }

        // Nodes outside the default scene become hidden roots so animation
        // targets still resolve.
        let objects: Vec<ObjectId> = objects
            .into_iter()
            .enumerate()
            .map(|(index, object)| {
                object.unwrap_or_else(|| {
                    let mut object = Object3D::group().with_name(self.nodes[index].name.clone());
                    object.visible = false;
                    scene.add(object)
                })
            })
            .collect();

        // Joints can live anywhere in the hierarchy, so skeletons are bound
        // once every node has an object.
        for (mesh, skin) in skinned {
            let Some(skin) = self.skins.get(skin) else {
                continue;
            };
            let joints = skin.joints.iter().filter_map(|&joint| objects.get(joint).copied()).collect();
            scene.object_mut(mesh).skeleton = Some(Skeleton::new(joints, skin.inverse_bind.clone()));
        }
        objects
    }
}

/// GLTF/GLB file loader.
pub struct GltfLoader;

impl GltfLoader {
    /// Create a new GLTF loader.
    pub fn new() -> Self {
        Self
    }

    /// Load a GLTF/GLB file from bytes.
    pub fn load_from_bytes(&self, data: &[u8]) -> Result<LoadedModel, LoadError> {
        // Try to strip extensionsRequired to be more lenient with unsupported extensions
        let modified_data = self.strip_required_extensions(data);
        let data_to_use = modified_data.as_deref().unwrap_or(data);

        let (gltf, buffer_data, _images) = gltf::import_slice(data_to_use)
            .map_err(|e| LoadError::new(format!("Failed to parse GLTF: {}", e)))?;
        let buffers: Vec<&[u8]> = buffer_data.iter().map(|b| b.0.as_slice()).collect();

        let textures = self.load_textures(&gltf, &buffers);

        let mut model = LoadedModel::default();

        // Load meshes and build mapping from GLTF mesh index to our flattened indices
        let mut mesh_index_map: Vec<Vec<usize>> = Vec::new();
        for mesh in gltf.meshes() {
            let mut indices_for_this_mesh = Vec::new();
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    log::warn!("skipping non-triangle primitive in mesh {:?}", mesh.name());
                    continue;
                }
                let geometry = self.load_primitive(&primitive, &buffers)?;
                indices_for_this_mesh.push(model.meshes.len());
                model.meshes.push(LoadedMesh {
                    name: mesh.name().unwrap_or("Unnamed").to_owned(),
                    geometry: Arc::new(geometry),
                    material: self.load_material(&primitive.material(), &textures),
                });
            }
            mesh_index_map.push(indices_for_this_mesh);
        }

        for node in gltf.nodes() {
            model.nodes.push(self.load_node(&node, &mesh_index_map));
        }

        for skin in gltf.skins() {
            model.skins.push(self.load_skin(&skin, &buffers));
        }

        if let Some(gltf_scene) = gltf.default_scene().or_else(|| gltf.scenes().next()) {
            model.roots = gltf_scene.nodes().map(|node| node.index()).collect();
        }

        for animation in gltf.animations() {
            model.clips.push(Arc::new(self.load_animation(&animation, &buffers)));
        }

        log::info!(
            "loaded glTF: {} meshes, {} nodes, {} skins, {} clips, {} triangles",
            model.meshes.len(),
            model.nodes.len(),
            model.skins.len(),
            model.clips.len(),
            model.total_triangles()
        );
        Ok(model)
    }

    /// Strip extensionsRequired from GLTF/GLB to allow loading files with unsupported extensions.
    fn strip_required_extensions(&self, data: &[u8]) -> Option<Vec<u8>> {
        if data.len() >= 4 && &data[0..4] == b"glTF" {
            self.strip_extensions_from_glb(data)
        } else {
            self.strip_extensions_from_json(data)
        }
    }

    /// Strip extensionsRequired from the JSON chunk of a GLB.
    fn strip_extensions_from_glb(&self, data: &[u8]) -> Option<Vec<u8>> {
        // GLB header: magic (4) + version (4) + length (4), then the JSON chunk
        const HEADER: usize = 12;
        const JSON_CHUNK: u32 = 0x4E4F534A;

        let word = |at: usize| data.get(at..at + 4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]));
        let json_length = word(HEADER)? as usize;
        if word(HEADER + 4)? != JSON_CHUNK {
            return None;
        }

        let json_start = HEADER + 8;
        let json_end = json_start + json_length;
        let modified_json = self.strip_extensions_from_json(data.get(json_start..json_end)?)?;

        // Pad to 4-byte alignment
        let padded_length = (modified_json.len() + 3) & !3;
        let padding = padded_length - modified_json.len();
        let new_total_length = HEADER + 8 + padded_length + (data.len() - json_end);

        let mut result = Vec::with_capacity(new_total_length);
        result.extend_from_slice(&data[0..8]);
        result.extend_from_slice(&(new_total_length as u32).to_le_bytes());
        result.extend_from_slice(&(padded_length as u32).to_le_bytes());
        result.extend_from_slice(&JSON_CHUNK.to_le_bytes());
        result.extend_from_slice(&modified_json);
        result.extend(std::iter::repeat(0x20u8).take(padding));
        result.extend_from_slice(&data[json_end..]);
        Some(result)
    }

    /// Strip extensionsRequired from JSON GLTF.
    fn strip_extensions_from_json(&self, data: &[u8]) -> Option<Vec<u8>> {
        let json_str = std::str::from_utf8(data).ok()?;
        if !json_str.contains("extensionsRequired") {
            return None;
        }
        let mut json: serde_json::Value = serde_json::from_str(json_str).ok()?;
        json.as_object_mut()?.remove("extensionsRequired");
        serde_json::to_vec(&json).ok()
    }

    /// Decode every texture stored in a buffer view.
    fn load_textures(&self, gltf: &gltf::Document, buffers: &[&[u8]]) -> HashMap<usize, Arc<Image>> {
        let mut textures = HashMap::new();
        for texture in gltf.textures() {
            let gltf::image::Source::View { view, .. } = texture.source().source() else {
                log::warn!("texture {} references an external image, skipped", texture.index());
                continue;
            };
            let start = view.offset();
            let end = start + view.length();
            let Some(bytes) = buffers.get(view.buffer().index()).and_then(|b| b.get(start..end)) else {
                continue;
            };
            match decode_image(bytes) {
                Ok(image) => {
                    textures.insert(texture.index(), Arc::new(image));
                }
                Err(e) => log::warn!("texture {}: {}", texture.index(), e),
            }
        }
        textures
    }

    /// Load a primitive as geometry.
    fn load_primitive(&self, primitive: &gltf::Primitive, buffers: &[&[u8]]) -> Result<Geometry, LoadError> {
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).copied());

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| LoadError::new("Primitive missing positions"))?
            .collect();
        let normals: Vec<[f32; 3]> = reader.read_normals().map(|n| n.collect()).unwrap_or_default();
        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|t| t.into_f32().collect())
            .unwrap_or_default();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let normal = normals.get(i).copied().unwrap_or([0.0; 3]);
                // glTF puts v = 0 at the top of the image.
                let uv = uvs.get(i).map_or([0.0, 0.0], |uv| [uv[0], 1.0 - uv[1]]);
                Vertex::new(position, normal, uv)
            })
            .collect();

        let mut geometry = Geometry::new(vertices, indices);
        if normals.is_empty() {
            compute_normals(&mut geometry);
        }

        let joints: Vec<[u16; 4]> = reader.read_joints(0).map(|j| j.into_u16().collect()).unwrap_or_default();
        let weights: Vec<[f32; 4]> = reader.read_weights(0).map(|w| w.into_f32().collect()).unwrap_or_default();
        if !joints.is_empty() {
            let skin = joints
                .iter()
                .zip(weights.iter().chain(std::iter::repeat(&[0.0; 4])))
                .map(|(j, &w)| SkinVertex::new((*j).map(u32::from), w))
                .collect();
            geometry = geometry.with_skin(skin);
        }
        Ok(geometry)
    }

    /// Load a skin's joints and inverse bind matrices.
    fn load_skin(&self, skin: &gltf::Skin, buffers: &[&[u8]]) -> LoadedSkin {
        let reader = skin.reader(|buffer| buffers.get(buffer.index()).copied());
        let joints: Vec<usize> = skin.joints().map(|joint| joint.index()).collect();
        let inverse_bind = reader
            .read_inverse_bind_matrices()
            .map(|matrices| matrices.map(|m| Mat4::from_cols_array_2d(&m)).collect())
            .unwrap_or_else(|| vec![Mat4::IDENTITY; joints.len()]);
        LoadedSkin { joints, inverse_bind }
    }

    /// Load a material.
    fn load_material(&self, material: &gltf::Material, textures: &HashMap<usize, Arc<Image>>) -> Material {
        let pbr = material.pbr_metallic_roughness();
        let [r, g, b, a] = pbr.base_color_factor();

        let mut loaded = Material::standard(Color::new(r, g, b));
        if material.alpha_mode() == gltf::material::AlphaMode::Blend {
            loaded = loaded.with_opacity(a);
        }
        if material.double_sided() {
            loaded = loaded.with_side(Side::Double);
        }
        if let Some(map) = pbr
            .base_color_texture()
            .and_then(|info| textures.get(&info.texture().index()))
        {
            loaded = loaded.with_map(map.clone());
        }
        loaded
    }

    /// Load a node with correct mesh index mapping.
    fn load_node(&self, node: &gltf::Node, mesh_index_map: &[Vec<usize>]) -> LoadedNode {
        let (translation, rotation, scale) = node.transform().decomposed();
        LoadedNode {
            name: node.name().unwrap_or("Node").to_owned(),
            transform: Transform::from_trs(
                Vec3::from(translation),
                Quat::from_array(rotation).normalize(),
                Vec3::from(scale),
            ),
            meshes: node
                .mesh()
                .and_then(|mesh| mesh_index_map.get(mesh.index()))
                .cloned()
                .unwrap_or_default(),
            children: node.children().map(|child| child.index()).collect(),
            skin: node.skin().map(|skin| skin.index()),
        }
    }

    /// Load an animation as a clip of node-transform tracks.
    fn load_animation(&self, animation: &gltf::Animation, buffers: &[&[u8]]) -> AnimationClip {
        use gltf::animation::util::ReadOutputs;

        let name = animation
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("animation_{}", animation.index()));
        let mut clip = AnimationClip::new(name);

        for channel in animation.channels() {
            let reader = channel.reader(|buffer| buffers.get(buffer.index()).copied());
            let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs()) else {
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            let interpolation = channel.sampler().interpolation();
            let target = channel.target().node().index();

            let (property, values) = match outputs {
                ReadOutputs::Translations(v) => (
                    TrackProperty::Translation,
                    TrackValues::Vector(keyframe_values(v.map(Vec3::from), interpolation)),
                ),
                ReadOutputs::Scales(v) => (
                    TrackProperty::Scale,
                    TrackValues::Vector(keyframe_values(v.map(Vec3::from), interpolation)),
                ),
                ReadOutputs::Rotations(v) => (
                    TrackProperty::Rotation,
                    TrackValues::Quaternion(keyframe_values(
                        v.into_f32().map(|q| Quat::from_array(q).normalize()),
                        interpolation,
                    )),
                ),
                ReadOutputs::MorphTargetWeights(_) => continue,
            };

            let mode = match interpolation {
                gltf::animation::Interpolation::Step => InterpolationMode::Step,
                _ => InterpolationMode::Linear,
            };
            clip.add_track(KeyframeTrack::new(target, property, times, values).with_interpolation(mode));
        }
        clip
    }
}

impl Default for GltfLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Keyframe values; cubic-spline samplers store (in-tangent, value,
/// out-tangent) triples and only the value is kept.
fn keyframe_values<T>(values: impl Iterator<Item = T>, interpolation: gltf::animation::Interpolation) -> Vec<T> {
    match interpolation {
        gltf::animation::Interpolation::CubicSpline => values.skip(1).step_by(3).collect(),
        _ => values.collect(),
    }
}

/// Smooth vertex normals from triangle faces.
fn compute_normals(geometry: &mut Geometry) {
    let mut normals = vec![Vec3::ZERO; geometry.vertices.len()];
    for tri in geometry.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(va), Some(vb), Some(vc)) = (geometry.vertices.get(a), geometry.vertices.get(b), geometry.vertices.get(c))
        else {
            continue;
        };
        let p0 = Vec3::from(va.position);
        let n = (Vec3::from(vb.position) - p0).cross(Vec3::from(vc.position) - p0);
        for i in [a, b, c] {
            normals[i] += n;
        }
    }
    for (vertex, n) in geometry.vertices.iter_mut().zip(normals) {
        vertex.normal = n.normalize_or_zero().to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, children: Vec<usize>, meshes: Vec<usize>) -> LoadedNode {
        LoadedNode {
            name: name.into(),
            transform: Transform::from_position(Vec3::new(children.len() as f32, 0.0, 0.0)),
            meshes,
            children,
            skin: None,
        }
    }

    fn triangle() -> Geometry {
        Geometry::new(
            vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
                Vertex::new([1.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
                Vertex::new([0.0, 1.0, 0.0], [0.0; 3], [0.0; 2]),
            ],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_compute_normals_faces_out_of_ccw_triangle() {
        let mut geometry = triangle();
        compute_normals(&mut geometry);
        for v in &geometry.vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_cubic_spline_keeps_middle_values() {
        let values = keyframe_values(0..9, gltf::animation::Interpolation::CubicSpline);
        assert_eq!(values, vec![1, 4, 7]);
        let values = keyframe_values(0..3, gltf::animation::Interpolation::Linear);
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[test]
    fn test_strip_required_extensions_from_json() {
        let loader = GltfLoader::new();
        let json = br#"{"asset":{"version":"2.0"},"extensionsRequired":["KHR_draco_mesh_compression"]}"#;
        let stripped = loader.strip_required_extensions(json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&stripped).unwrap();
        assert!(value.get("extensionsRequired").is_none());
        assert!(loader.strip_required_extensions(br#"{"asset":{}}"#).is_none());
    }

    #[test]
    fn test_instantiate_keeps_node_order_and_hierarchy() {
        let model = LoadedModel {
            meshes: vec![LoadedMesh {
                name: "body".into(),
                geometry: Arc::new(triangle()),
                material: Material::default(),
            }],
            nodes: vec![node("root", vec![2], vec![]), node("orphan", vec![], vec![]), node("body", vec![], vec![0])],
            roots: vec![0],
            skins: Vec::new(),
            clips: Vec::new(),
        };

        let mut scene = Scene::new();
        let holder = scene.add(Object3D::group());
        let objects = model.instantiate(&mut scene, Some(holder));

        assert_eq!(objects.len(), 3);
        assert_eq!(scene.object(objects[0]).name, "root");
        assert_eq!(scene.object(objects[0]).parent(), Some(holder));
        assert_eq!(scene.object(objects[2]).parent(), Some(objects[0]));
        assert_eq!(scene.object(objects[2]).children().len(), 1);
        assert!(!scene.object(objects[1]).visible);
        assert_eq!(scene.visible_meshes().len(), 1);
    }

    #[test]
    fn test_instantiate_binds_skeleton_to_skinned_meshes() {
        let mut body = node("body", vec![], vec![0]);
        body.skin = Some(0);
        let model = LoadedModel {
            meshes: vec![LoadedMesh {
                name: "body".into(),
                geometry: Arc::new(triangle()),
                material: Material::default(),
            }],
            // The joint comes after the mesh in the hierarchy.
            nodes: vec![node("root", vec![1, 2], vec![]), body, node("bone", vec![], vec![])],
            roots: vec![0],
            skins: vec![LoadedSkin {
                joints: vec![2],
                inverse_bind: vec![Mat4::IDENTITY],
            }],
            clips: Vec::new(),
        };

        let mut scene = Scene::new();
        let objects = model.instantiate(&mut scene, None);
        let mesh = scene.object(objects[1]).children()[0];
        let skeleton = scene.object(mesh).skeleton.as_ref().unwrap();
        assert_eq!(skeleton.joints, vec![objects[2]]);
        assert_eq!(skeleton.inverse_bind, vec![Mat4::IDENTITY]);
        assert!(scene.object(objects[1]).skeleton.is_none());
    }

    #[test]
    fn test_garbage_is_load_error() {
        assert!(GltfLoader::new().load_from_bytes(b"garbage").is_err());
    }
}
