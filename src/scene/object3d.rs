//! Scene objects.

use super::{MaterialId, ObjectId, Skeleton, Transform};
use crate::geometry::Geometry;
use glam::Vec3;
use std::sync::Arc;

/// What an object draws.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    /// Transform-only node.
    Group,
    /// Triangle mesh with a material.
    Mesh {
        /// Shared geometry.
        geometry: Arc<Geometry>,
        /// Material in the owning scene.
        material: MaterialId,
    },
}

/// A node of the scene graph.
#[derive(Debug, Clone)]
pub struct Object3D {
    /// Optional name, used to find nodes of loaded models.
    pub name: String,
    /// Local transform.
    pub transform: Transform,
    /// Hidden objects and their descendants are skipped when drawing.
    pub visible: bool,
    /// Node payload.
    pub kind: ObjectKind,
    /// Joints deforming a skinned mesh.
    pub skeleton: Option<Skeleton>,
    /// Rendered into the shadow map.
    pub cast_shadow: bool,
    /// Darkened where a caster blocks the shadow light.
    pub receive_shadow: bool,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
}

impl Object3D {
    fn with_kind(kind: ObjectKind) -> Self {
        Self {
            name: String::new(),
            transform: Transform::new(),
            visible: true,
            kind,
            skeleton: None,
            cast_shadow: false,
            receive_shadow: false,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Create an empty group.
    pub fn group() -> Self {
        Self::with_kind(ObjectKind::Group)
    }

    /// Create a mesh.
    pub fn mesh(geometry: Arc<Geometry>, material: MaterialId) -> Self {
        Self::with_kind(ObjectKind::Mesh { geometry, material })
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the local position.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Set the local Euler rotation.
    pub fn with_rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.set_rotation(x, y, z);
        self
    }

    /// Bind a skeleton.
    pub fn with_skeleton(mut self, skeleton: Skeleton) -> Self {
        self.skeleton = Some(skeleton);
        self
    }

    /// Set the shadow flags.
    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }

    /// Parent object, if any.
    #[inline]
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Child objects.
    #[inline]
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Material of a mesh.
    pub fn material(&self) -> Option<MaterialId> {
        match &self.kind {
            ObjectKind::Mesh { material, .. } => Some(*material),
            ObjectKind::Group => None,
        }
    }

    /// Geometry of a mesh.
    pub fn geometry(&self) -> Option<&Arc<Geometry>> {
        match &self.kind {
            ObjectKind::Mesh { geometry, .. } => Some(geometry),
            ObjectKind::Group => None,
        }
    }
}
