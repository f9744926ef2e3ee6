//! # Scene Module
//!
//! Scene graph stored as an arena: a [`Scene`] owns every [`Object3D`] and
//! hands out [`ObjectId`]s. Parent links give hierarchical transforms.

mod object3d;
mod scene;
mod skeleton;
mod transform;

pub use object3d::{Object3D, ObjectKind};
pub use scene::{Background, Fog, MeshDraw, Scene};
pub use skeleton::Skeleton;
pub use transform::Transform;

/// Handle of an object inside its scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    /// Position in the scene's object table.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Handle of a material inside its scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub(crate) usize);

/// Handle of a light inside its scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightId(pub(crate) usize);
