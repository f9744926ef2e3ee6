//! Joint hierarchy bound to a skinned mesh.

use super::ObjectId;
use glam::Mat4;

/// Joints driving a skinned mesh, with their inverse bind matrices.
///
/// Vertex joint index `j` refers to `joints[j]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    /// Joint objects.
    pub joints: Vec<ObjectId>,
    /// Mesh-space to joint-space transform at bind time, per joint.
    pub inverse_bind: Vec<Mat4>,
}

impl Skeleton {
    /// Create a skeleton. Missing inverse bind matrices default to identity.
    pub fn new(joints: Vec<ObjectId>, mut inverse_bind: Vec<Mat4>) -> Self {
        inverse_bind.resize(joints.len(), Mat4::IDENTITY);
        Self { joints, inverse_bind }
    }

    /// Number of joints.
    #[inline]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Whether the skeleton has no joints.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}
