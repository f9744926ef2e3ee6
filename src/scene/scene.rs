//! Scene container - owns the object graph, materials and lights.

use super::{LightId, MaterialId, Object3D, ObjectId, ObjectKind, Transform};
use crate::core::Id;
use crate::geometry::Geometry;
use crate::light::{Light, ShadowView};
use crate::material::Material;
use crate::math::Color;
use glam::{Mat4, Vec3};
use std::sync::Arc;

/// Background type for the scene.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Background {
    /// Keep whatever the renderer clears to.
    #[default]
    None,
    /// Solid color background.
    Color(Color),
}

/// Fog type for the scene.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Fog {
    /// No fog.
    #[default]
    None,
    /// Linear fog with near and far distances.
    Linear {
        /// Fog color.
        color: Color,
        /// Distance where fog starts.
        near: f32,
        /// Distance where fog is fully opaque.
        far: f32,
    },
}

impl Fog {
    /// Fog factor in `[0, 1]` at a view distance.
    pub fn factor(&self, distance: f32) -> f32 {
        match *self {
            Fog::None => 0.0,
            Fog::Linear { near, far, .. } => {
                if far <= near {
                    return if distance >= far { 1.0 } else { 0.0 };
                }
                ((distance - near) / (far - near)).clamp(0.0, 1.0)
            }
        }
    }
}

/// A mesh ready to draw: world matrix resolved, material looked up.
#[derive(Debug, Clone)]
pub struct MeshDraw<'a> {
    /// Object being drawn.
    pub object: ObjectId,
    /// Geometry.
    pub geometry: &'a Arc<Geometry>,
    /// Material.
    pub material: &'a Material,
    /// Object to world transform.
    pub world: Mat4,
    /// Per-joint skinning matrices in mesh space, for skinned meshes.
    pub joints: Option<Vec<Mat4>>,
    /// Rendered into the shadow map.
    pub cast_shadow: bool,
    /// Darkened where a caster blocks the shadow light.
    pub receive_shadow: bool,
}

impl MeshDraw<'_> {
    /// Whether the draw deforms its geometry with joint matrices.
    pub fn is_skinned(&self) -> bool {
        self.joints.is_some() && self.geometry.is_skinned()
    }
}

/// A scene: root container for objects, materials and lights.
#[derive(Debug, Clone)]
pub struct Scene {
    id: Id,
    objects: Vec<Object3D>,
    roots: Vec<ObjectId>,
    materials: Vec<Material>,
    lights: Vec<Light>,
    /// Scene background.
    pub background: Background,
    /// Scene fog.
    pub fog: Fog,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            id: Id::new(),
            objects: Vec::new(),
            roots: Vec::new(),
            materials: Vec::new(),
            lights: Vec::new(),
            background: Background::None,
            fog: Fog::None,
        }
    }

    /// Unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Add an object at the root.
    pub fn add(&mut self, mut object: Object3D) -> ObjectId {
        let id = ObjectId(self.objects.len());
        object.parent = None;
        object.children.clear();
        self.objects.push(object);
        self.roots.push(id);
        id
    }

    /// Add an object as a child of `parent`.
    ///
    /// # Panics
    /// If `parent` does not belong to this scene.
    pub fn add_child(&mut self, parent: ObjectId, mut object: Object3D) -> ObjectId {
        assert!(parent.0 < self.objects.len(), "parent {:?} is not in this scene", parent);
        let id = ObjectId(self.objects.len());
        object.parent = Some(parent);
        object.children.clear();
        self.objects.push(object);
        self.objects[parent.0].children.push(id);
        id
    }

    /// Number of objects.
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene holds no objects.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Root objects.
    #[inline]
    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    /// Look up an object.
    #[inline]
    pub fn get(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id.0)
    }

    /// Look up an object mutably.
    #[inline]
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id.0)
    }

    /// Borrow an object.
    ///
    /// # Panics
    /// If `id` does not belong to this scene.
    #[inline]
    pub fn object(&self, id: ObjectId) -> &Object3D {
        &self.objects[id.0]
    }

    /// Borrow an object mutably.
    ///
    /// # Panics
    /// If `id` does not belong to this scene.
    #[inline]
    pub fn object_mut(&mut self, id: ObjectId) -> &mut Object3D {
        &mut self.objects[id.0]
    }

    /// Shortcut to an object's transform.
    #[inline]
    pub fn transform_mut(&mut self, id: ObjectId) -> &mut Transform {
        &mut self.objects[id.0].transform
    }

    /// Iterate over all objects.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object3D)> {
        self.objects.iter().enumerate().map(|(i, o)| (ObjectId(i), o))
    }

    /// First object with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .position(|o| o.name == name)
            .map(ObjectId)
    }

    /// Register a material.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    /// Borrow a material.
    #[inline]
    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    /// Borrow a material mutably.
    #[inline]
    pub fn material_mut(&mut self, id: MaterialId) -> &mut Material {
        &mut self.materials[id.0]
    }

    /// Swap the material of a mesh. Groups are left untouched.
    pub fn set_material(&mut self, object: ObjectId, material: MaterialId) {
        if let Some(Object3D { kind: ObjectKind::Mesh { material: current, .. }, .. }) =
            self.objects.get_mut(object.0)
        {
            *current = material;
        }
    }

    /// Add a light.
    pub fn add_light(&mut self, light: impl Into<Light>) -> LightId {
        self.lights.push(light.into());
        LightId(self.lights.len() - 1)
    }

    /// Borrow a light mutably.
    #[inline]
    pub fn light_mut(&mut self, id: LightId) -> &mut Light {
        &mut self.lights[id.0]
    }

    /// All lights.
    #[inline]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// The shadow-casting light, if any.
    pub fn shadow_view(&self) -> Option<ShadowView> {
        ShadowView::find(&self.lights)
    }

    /// Objects in the subtree rooted at `root`, depth first.
    pub fn descendants(&self, root: ObjectId) -> Vec<ObjectId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            found.push(id);
            stack.extend(self.objects[id.0].children.iter().rev());
        }
        found
    }

    /// Skinning matrices of a skinned mesh whose world matrix is `world`:
    /// bind-pose mesh space to posed mesh space, one per joint.
    pub fn joint_matrices(&self, mesh: ObjectId, world: Mat4) -> Option<Vec<Mat4>> {
        let skeleton = self.objects.get(mesh.0)?.skeleton.as_ref()?;
        let to_mesh = world.inverse();
        Some(
            skeleton
                .joints
                .iter()
                .zip(&skeleton.inverse_bind)
                .map(|(&joint, inverse_bind)| to_mesh * self.world_matrix(joint) * *inverse_bind)
                .collect(),
        )
    }

    /// Object to world matrix, composed through the parent chain.
    pub fn world_matrix(&self, id: ObjectId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(cid) = current {
            let object = &self.objects[cid.0];
            matrix = object.transform.matrix() * matrix;
            current = object.parent;
        }
        matrix
    }

    /// World-space position of an object.
    pub fn world_position(&self, id: ObjectId) -> Vec3 {
        self.world_matrix(id).w_axis.truncate()
    }

    /// Whether the object and all its ancestors are visible.
    pub fn is_visible(&self, id: ObjectId) -> bool {
        let mut current = Some(id);
        while let Some(cid) = current {
            let object = &self.objects[cid.0];
            if !object.visible {
                return false;
            }
            current = object.parent;
        }
        true
    }

    /// Visible meshes in depth-first order with resolved world matrices.
    pub fn visible_meshes(&self) -> Vec<MeshDraw<'_>> {
        let mut draws = Vec::new();
        let mut stack: Vec<(ObjectId, Mat4)> =
            self.roots.iter().rev().map(|&id| (id, Mat4::IDENTITY)).collect();

        while let Some((id, parent_world)) = stack.pop() {
            let object = &self.objects[id.0];
            if !object.visible {
                continue;
            }
            let world = parent_world * object.transform.matrix();
            if let ObjectKind::Mesh { geometry, material } = &object.kind {
                draws.push(MeshDraw {
                    object: id,
                    geometry,
                    material: &self.materials[material.0],
                    world,
                    joints: self.joint_matrices(id, world),
                    cast_shadow: object.cast_shadow,
                    receive_shadow: object.receive_shadow,
                });
            }
            stack.extend(object.children.iter().rev().map(|&c| (c, world)));
        }

        draws
    }

    /// Visible meshes in draw order as seen from `eye`: opaque meshes in
    /// graph order, then transparent ones back to front.
    pub fn render_list(&self, eye: Vec3) -> Vec<MeshDraw<'_>> {
        let (mut opaque, mut transparent): (Vec<_>, Vec<_>) =
            self.visible_meshes().into_iter().partition(|d| !d.material.transparent);
        let depth = |d: &MeshDraw<'_>| d.world.w_axis.truncate().distance_squared(eye);
        transparent.sort_by(|a, b| depth(b).total_cmp(&depth(a)));
        opaque.append(&mut transparent);
        opaque
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoxGeometry;
    use crate::scene::Skeleton;

    fn cube_scene() -> (Scene, ObjectId, ObjectId) {
        let mut scene = Scene::new();
        let geometry = Arc::new(BoxGeometry::cube(1.0).build());
        let material = scene.add_material(Material::basic(Color::RED));
        let group = scene.add(Object3D::group().with_position(Vec3::new(1.0, 0.0, 0.0)));
        let cube = scene.add_child(
            group,
            Object3D::mesh(geometry, material).with_position(Vec3::new(0.0, 2.0, 0.0)),
        );
        (scene, group, cube)
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let (scene, _, cube) = cube_scene();
        assert_eq!(scene.world_position(cube), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_hidden_parent_hides_children() {
        let (mut scene, group, cube) = cube_scene();
        assert_eq!(scene.visible_meshes().len(), 1);
        scene.object_mut(group).visible = false;
        assert!(!scene.is_visible(cube));
        assert!(scene.visible_meshes().is_empty());
    }

    #[test]
    fn test_set_material_swaps_mesh_material() {
        let (mut scene, group, cube) = cube_scene();
        let blue = scene.add_material(Material::basic(Color::BLUE));
        scene.set_material(cube, blue);
        scene.set_material(group, blue);
        assert_eq!(scene.object(cube).material(), Some(blue));
        assert_eq!(scene.object(group).material(), None);
    }

    #[test]
    fn test_transparent_meshes_draw_last_back_to_front() {
        let (mut scene, _, cube) = cube_scene();
        let geometry = Arc::new(BoxGeometry::cube(1.0).build());
        let glass = scene.add_material(Material::basic(Color::WHITE).with_opacity(0.5));
        let near = scene.add(Object3D::mesh(geometry.clone(), glass).with_position(Vec3::new(0.0, 0.0, 5.0)));
        let far = scene.add(Object3D::mesh(geometry, glass).with_position(Vec3::new(0.0, 0.0, -5.0)));
        let order: Vec<_> = scene.render_list(Vec3::new(0.0, 0.0, 10.0)).iter().map(|d| d.object).collect();
        assert_eq!(order, vec![cube, far, near]);
    }

    #[test]
    fn test_joint_matrices_follow_posed_joints() {
        let (mut scene, group, cube) = cube_scene();
        let joint = scene.add(Object3D::group().with_position(Vec3::new(0.0, 1.0, 0.0)));
        let world = scene.world_matrix(cube);
        let bind = (world.inverse() * scene.world_matrix(joint)).inverse();
        scene.object_mut(cube).skeleton = Some(Skeleton::new(vec![joint], vec![bind]));

        let rest = scene.joint_matrices(cube, world).unwrap();
        assert!(rest[0].abs_diff_eq(Mat4::IDENTITY, 1e-5));

        scene.transform_mut(joint).position.x = 3.0;
        let posed = scene.joint_matrices(cube, world).unwrap();
        let moved = posed[0].transform_point3(Vec3::ZERO);
        assert!((moved - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
        assert!(scene.joint_matrices(group, Mat4::IDENTITY).is_none());
    }

    #[test]
    fn test_descendants_walk_subtree() {
        let (mut scene, group, cube) = cube_scene();
        let other = scene.add(Object3D::group());
        assert_eq!(scene.descendants(group), vec![group, cube]);
        assert_eq!(scene.descendants(other), vec![other]);
    }

    #[test]
    fn test_linear_fog_factor() {
        let fog = Fog::Linear { color: Color::BLACK, near: 10.0, far: 20.0 };
        assert_eq!(fog.factor(5.0), 0.0);
        assert!((fog.factor(15.0) - 0.5).abs() < 1e-6);
        assert_eq!(fog.factor(25.0), 1.0);
    }
}
