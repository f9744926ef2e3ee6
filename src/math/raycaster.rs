//! Raycaster utility for screen-to-world ray casting.

use super::Ray;
use crate::camera::PerspectiveCamera;
use crate::material::Side;
use crate::scene::{ObjectId, Scene};
use glam::{Mat4, Vec2, Vec3};

/// A ray hit against a scene object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Object that was hit.
    pub object: ObjectId,
    /// World-space distance from the ray origin.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
}

/// Casts rays from the camera through normalized device coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Raycaster {
    /// Current ray in world space.
    pub ray: Ray,
    /// Hits closer than this are ignored.
    pub near: f32,
    /// Hits further than this are ignored.
    pub far: f32,
}

impl Default for Raycaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Raycaster {
    /// Create a raycaster with an unset ray.
    pub fn new() -> Self {
        Self {
            ray: Ray::new(Vec3::ZERO, Vec3::NEG_Z),
            near: 0.0,
            far: f32::INFINITY,
        }
    }

    /// Create a ray from normalized device coordinates.
    ///
    /// Unprojects NDC depth 0 and 1 (wgpu clip range) through the inverse
    /// of projection * view.
    pub fn ray_from_ndc(ndc: Vec2, view_proj_inverse: &Mat4) -> Ray {
        let near_world = view_proj_inverse.project_point3(ndc.extend(0.0));
        let far_world = view_proj_inverse.project_point3(ndc.extend(1.0));
        Ray::new(near_world, (far_world - near_world).normalize_or_zero())
    }

    /// Aim the ray from the camera through `ndc` (x right, y up, both in -1..1).
    pub fn set_from_camera(&mut self, ndc: Vec2, camera: &PerspectiveCamera) {
        let inverse = camera.view_projection_matrix().inverse();
        let ray = Self::ray_from_ndc(ndc, &inverse);
        // Start at the camera so distances are measured from the eye.
        self.ray = Ray::new(camera.position, ray.direction);
    }

    /// Closest hit on one object (its own geometry only).
    pub fn intersect_object(&self, scene: &Scene, id: ObjectId) -> Option<Intersection> {
        let object = scene.get(id)?;
        let geometry = object.geometry()?;
        let material = scene.material(object.material()?);
        if !scene.is_visible(id) {
            return None;
        }

        let world = scene.world_matrix(id);
        let local_ray = self.ray.apply_matrix4(&world.inverse());
        let cull = material.side == Side::Front;

        geometry
            .triangles()
            .filter_map(|[a, b, c]| {
                let (a, c) = if material.side == Side::Back { (c, a) } else { (a, c) };
                let (t, _, _) = local_ray.intersect_triangle(a, b, c, cull)?;
                let point = world.transform_point3(local_ray.at(t));
                let distance = self.ray.origin.distance(point);
                (distance >= self.near && distance <= self.far).then_some(Intersection {
                    object: id,
                    distance,
                    point,
                })
            })
            .min_by(|x, y| x.distance.total_cmp(&y.distance))
    }

    /// Hits on a set of candidate objects, sorted by distance (closest first).
    pub fn intersect_objects(&self, scene: &Scene, candidates: &[ObjectId]) -> Vec<Intersection> {
        let mut hits: Vec<Intersection> = candidates
            .iter()
            .filter_map(|&id| self.intersect_object(scene, id))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PlaneGeometry;
    use crate::material::Material;
    use crate::math::Color;
    use crate::scene::Object3D;
    use std::f32::consts::FRAC_PI_2;
    use std::sync::Arc;

    fn floor_scene() -> (Scene, Vec<ObjectId>) {
        let mut scene = Scene::new();
        let geometry = Arc::new(PlaneGeometry::new(1.0, 1.0).build());
        let material = scene.add_material(Material::phong(Color::WHITE));
        let tiles = (0..3)
            .map(|i| {
                scene.add(
                    Object3D::mesh(geometry.clone(), material)
                        .with_position(Vec3::new(i as f32 - 1.0, 0.0, 0.0))
                        .with_rotation(-FRAC_PI_2, 0.0, 0.0),
                )
            })
            .collect();
        (scene, tiles)
    }

    #[test]
    fn test_center_ray_hits_looked_at_point() {
        let mut camera = PerspectiveCamera::new(60.0, 1.0, 0.1, 100.0);
        camera.set_position(Vec3::new(0.0, 20.0, 20.0));
        camera.look_at(Vec3::ZERO);

        let mut raycaster = Raycaster::new();
        raycaster.set_from_camera(Vec2::ZERO, &camera);
        let expected = (Vec3::ZERO - camera.position).normalize();
        assert!((raycaster.ray.direction - expected).length() < 1e-4);
    }

    #[test]
    fn test_hits_only_the_tile_under_the_ray() {
        let (scene, tiles) = floor_scene();
        let raycaster = Raycaster {
            ray: Ray::new(Vec3::new(1.1, 5.0, 0.2), Vec3::NEG_Y),
            ..Raycaster::new()
        };
        let hits = raycaster.intersect_objects(&scene, &tiles);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object, tiles[2]);
        assert!((hits[0].distance - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_front_side_tiles_are_not_hit_from_below() {
        let (scene, tiles) = floor_scene();
        let raycaster = Raycaster {
            ray: Ray::new(Vec3::new(0.0, -5.0, 0.0), Vec3::Y),
            ..Raycaster::new()
        };
        assert!(raycaster.intersect_objects(&scene, &tiles).is_empty());
    }
}
