//! Headless rendering.
//!
//! [`SoftwareTarget`] implements [`crate::postprocessing::FrameTarget`] on the
//! CPU so a composer's pass list can run without a GPU.

mod software_target;

pub use software_target::SoftwareTarget;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;
    use crate::geometry::{PlaneGeometry, SkinVertex};
    use crate::light::{DirectionalLight, DirectionalShadow};
    use crate::material::Material;
    use crate::math::Color;
    use crate::postprocessing::{EffectComposer, FrameTarget, Pass, ScreenEffect, StencilMode};
    use crate::scene::{Object3D, Scene, Skeleton};
    use glam::Vec3;
    use std::sync::Arc;

    const SIZE: u32 = 64;
    const CENTER_PIXEL: (u32, u32) = (21, 32);
    const MASK_PIXEL: (u32, u32) = (43, 32);
    const CORNER_PIXEL: (u32, u32) = (2, 2);

    fn quad_scene(size: f32, position: Vec3, color: Color) -> Scene {
        let mut scene = Scene::new();
        let material = scene.add_material(Material::basic(color));
        let geometry = Arc::new(PlaneGeometry::new(size, size).build());
        scene.add(Object3D::mesh(geometry, material).with_position(position));
        scene
    }

    fn scenes() -> Vec<Scene> {
        vec![
            quad_scene(1.0, Vec3::new(-2.0, 0.0, 0.0), Color::splat(0.5)),
            quad_scene(2.0, Vec3::new(2.0, 0.0, 0.0), Color::WHITE),
            quad_scene(20.0, Vec3::new(0.0, 0.0, -1.0), Color::new(0.25, 0.5, 0.75)),
        ]
    }

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(60.0, 1.0, 0.1, 100.0);
        camera.set_position(Vec3::new(0.0, 0.0, 10.0));
        camera.look_at(Vec3::ZERO);
        camera
    }

    fn masked_passes() -> Vec<Pass> {
        vec![
            Pass::Clear { color: Color::splat(0.2) },
            Pass::Render { scene: 0, clear: true },
            Pass::Mask { scene: 1, inverse: false },
            Pass::Render { scene: 2, clear: false },
            Pass::ClearMask,
            Pass::Effect(ScreenEffect::GAMMA),
        ]
    }

    fn render(passes: Vec<Pass>) -> SoftwareTarget {
        let mut composer = EffectComposer::new(Color::splat(0.1));
        *composer.passes_mut() = passes;
        let mut target = SoftwareTarget::new(SIZE, SIZE);
        composer.render(&scenes(), &camera(), &mut target).unwrap();
        target
    }

    fn close(a: [f32; 4], b: [f32; 3]) -> bool {
        (0..3).all(|k| (a[k] - b[k]).abs() < 1e-4)
    }

    #[test]
    fn test_masked_content_only_inside_silhouette() {
        let target = render(masked_passes());
        let g = |v: f32| ScreenEffect::GAMMA.apply(v);

        assert!(close(target.pixel(CENTER_PIXEL.0, CENTER_PIXEL.1), [g(0.5); 3]));
        assert!(close(target.pixel(MASK_PIXEL.0, MASK_PIXEL.1), [g(0.25), g(0.5), g(0.75)]));
        assert!(close(target.pixel(CORNER_PIXEL.0, CORNER_PIXEL.1), [g(0.1); 3]));
        assert_eq!(target.stencil_at(MASK_PIXEL.0, MASK_PIXEL.1), 1);
        assert_eq!(target.stencil_at(CORNER_PIXEL.0, CORNER_PIXEL.1), 0);
    }

    #[test]
    fn test_swapping_adjacent_passes_changes_output() {
        let reference = render(masked_passes());
        for i in 0..masked_passes().len() - 1 {
            let mut passes = masked_passes();
            passes.swap(i, i + 1);
            let swapped = render(passes);
            assert_ne!(
                reference.to_rgba8(),
                swapped.to_rgba8(),
                "swapping passes {} and {} left the image unchanged",
                i,
                i + 1
            );
        }
    }

    #[test]
    fn test_inverse_mask_draws_outside_silhouette() {
        let mut passes = masked_passes();
        passes[2] = Pass::Mask { scene: 1, inverse: true };
        let target = render(passes);
        let g = |v: f32| ScreenEffect::GAMMA.apply(v);
        assert!(close(target.pixel(CORNER_PIXEL.0, CORNER_PIXEL.1), [g(0.25), g(0.5), g(0.75)]));
        assert!(close(target.pixel(MASK_PIXEL.0, MASK_PIXEL.1), [g(0.1); 3]));
    }

    #[test]
    fn test_front_faces_only_by_default() {
        let mut scene = quad_scene(2.0, Vec3::ZERO, Color::RED);
        scene.transform_mut(scene.roots()[0]).set_rotation(0.0, std::f32::consts::PI, 0.0);
        let mut target = SoftwareTarget::new(SIZE, SIZE);
        target.draw_scene(&scene, &camera(), StencilMode::Off);
        assert_eq!(target.pixel(32, 32), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_nearer_surface_wins() {
        let mut scene = quad_scene(4.0, Vec3::new(0.0, 0.0, 1.0), Color::GREEN);
        let material = scene.add_material(Material::basic(Color::BLUE));
        let geometry = Arc::new(PlaneGeometry::new(4.0, 4.0).build());
        scene.add(Object3D::mesh(geometry, material).with_position(Vec3::new(0.0, 0.0, -1.0)));
        let mut target = SoftwareTarget::new(SIZE, SIZE);
        target.draw_scene(&scene, &camera(), StencilMode::Off);
        assert_eq!(target.pixel(32, 32), [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_skinned_mesh_follows_its_joint() {
        let mut scene = Scene::new();
        let material = scene.add_material(Material::basic(Color::RED));
        let plane = PlaneGeometry::new(2.0, 2.0).build();
        let count = plane.vertices.len();
        let geometry = Arc::new(plane.with_skin(vec![SkinVertex::new([0; 4], [1.0, 0.0, 0.0, 0.0]); count]));
        let joint = scene.add(Object3D::group());
        let mesh = scene.add(
            Object3D::mesh(geometry, material).with_skeleton(Skeleton::new(vec![joint], vec![glam::Mat4::IDENTITY])),
        );

        let mut target = SoftwareTarget::new(SIZE, SIZE);
        target.draw_scene(&scene, &camera(), StencilMode::Off);
        assert_eq!(target.pixel(32, 32), [1.0, 0.0, 0.0, 1.0]);

        // The mesh object stays put; only the joint moves.
        scene.transform_mut(joint).position.x = 3.0;
        let mut target = SoftwareTarget::new(SIZE, SIZE);
        target.draw_scene(&scene, &camera(), StencilMode::Off);
        assert_eq!(scene.world_position(mesh), Vec3::ZERO);
        assert_eq!(target.pixel(32, 32), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(target.pixel(48, 32), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_caster_dims_receiver_away_from_light() {
        let mut scene = Scene::new();
        scene.add_light(
            DirectionalLight::new(Color::WHITE, 1.0, Vec3::new(4.0, 0.0, 10.0)).with_shadow(DirectionalShadow::default()),
        );
        let floor = scene.add_material(Material::basic(Color::WHITE));
        let blocker = scene.add_material(Material::basic(Color::BLUE));
        scene.add(Object3D::mesh(Arc::new(PlaneGeometry::new(8.0, 8.0).build()), floor).with_shadows(false, true));
        let caster = scene.add(
            Object3D::mesh(Arc::new(PlaneGeometry::new(2.0, 2.0).build()), blocker)
                .with_position(Vec3::new(0.0, 0.0, 2.0))
                .with_shadows(true, false),
        );

        let mut target = SoftwareTarget::new(SIZE, SIZE);
        target.draw_scene(&scene, &camera(), StencilMode::Off);
        // Floor at x = -1.5 lies in the shadow cast away from the light, x = 1.5 does not.
        assert!(close(target.pixel(23, 32), [0.5; 3]));
        assert!(close(target.pixel(40, 32), [1.0; 3]));
        assert!(close(target.pixel(32, 32), [0.0, 0.0, 1.0]));

        scene.object_mut(caster).cast_shadow = false;
        let mut target = SoftwareTarget::new(SIZE, SIZE);
        target.draw_scene(&scene, &camera(), StencilMode::Off);
        assert!(close(target.pixel(23, 32), [1.0; 3]));
    }
}
