//! Demo 02: a desk fan whose blades are cut out of a textured plane with a
//! stencil mask.
//!
//! Three scenes share one camera. The stand and hub are drawn normally, the
//! blade scene only writes the stencil buffer, and the textured plane is
//! drawn through that stencil so it shows up in the shape of the blades.

use super::{Demo, Frame, Setup};
use crate::animation::FanMotion;
use crate::camera::PerspectiveCamera;
use crate::controls::OrbitControls;
use crate::core::{FrameTime, Result};
use crate::geometry::{CylinderGeometry, PlaneGeometry, RingGeometry};
use crate::light::{AmbientLight, DirectionalLight};
use crate::loaders::load_image;
use crate::material::{Material, Side};
use crate::math::Color;
use crate::postprocessing::{EffectComposer, Pass, ScreenEffect};
use crate::scene::{Object3D, ObjectId, Scene};
use crate::texture::Image;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};
use std::sync::Arc;

/// Scene drawn first: stand and hub.
pub const FAN_CENTER_SCENE: usize = 0;
/// Scene whose silhouette is the stencil mask.
pub const MASK_SCENE: usize = 1;
/// Scene drawn through the mask.
pub const PLANE_SCENE: usize = 2;

/// Fan constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanConfig {
    /// Image shown through the blades.
    pub image_url: String,
    /// Frame clear color.
    pub clear_color: Color,
    /// Initial camera position.
    pub camera_position: Vec3,
    /// Far clipping plane.
    pub far: f32,
    /// Number of blades.
    pub blade_count: usize,
    /// Blade inner radius.
    pub blade_inner_radius: f32,
    /// Blade outer radius.
    pub blade_outer_radius: f32,
    /// Angular width of one blade in degrees.
    pub blade_sweep: f32,
    /// Ring segments per blade.
    pub blade_segments: u32,
    /// Depth of the blades in front of the hub.
    pub blade_z: f32,
    /// Side of the textured plane.
    pub plane_size: f32,
    /// Depth of the textured plane.
    pub plane_z: f32,
    /// Spin and swing parameters.
    pub motion: FanMotion,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            image_url: "assets/img/webglschool.jpg".into(),
            clear_color: Color::from_hex(0x111111),
            camera_position: Vec3::new(0.0, 2.0, 10.0),
            far: 50.0,
            blade_count: 4,
            blade_inner_radius: 0.25,
            blade_outer_radius: 2.0,
            blade_sweep: 30.0,
            blade_segments: 32,
            blade_z: 0.26,
            plane_size: 4.2,
            plane_z: 0.25,
            motion: FanMotion::default(),
        }
    }
}

impl FanConfig {
    /// Parse a configuration, filling missing fields from the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Fan demo state.
pub struct Fan {
    config: FanConfig,
    scenes: Vec<Scene>,
    composer: EffectComposer,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    motion: FanMotion,
    blade_group: ObjectId,
    center_group: ObjectId,
    plane_group: ObjectId,
    spin: f32,
    yaw: f32,
}

impl Fan {
    /// Fetch the plane image and build the demo.
    pub async fn load(config: FanConfig) -> Result<Self> {
        let image = load_image(&config.image_url).await?;
        Ok(Self::new(config, image))
    }

    /// Build the demo around an already decoded image.
    pub fn new(config: FanConfig, image: Arc<Image>) -> Self {
        let white = || Material::phong(Color::WHITE).with_side(Side::Double);
        let light = || DirectionalLight::new(Color::WHITE, 1.0, Vec3::ONE);

        let mut fan_center = Scene::new();
        fan_center.add_light(light());
        let metal = fan_center.add_material(white());
        let center_group = fan_center.add(Object3D::group().with_name("center"));
        fan_center.add_child(
            center_group,
            Object3D::mesh(Arc::new(CylinderGeometry::new(0.25, 0.25, 1.0, 32).build()), metal)
                .with_name("hub")
                .with_rotation(FRAC_PI_2, 0.0, 0.0),
        );
        fan_center.add(
            Object3D::mesh(Arc::new(CylinderGeometry::new(0.25, 0.25, 3.0, 32).build()), metal)
                .with_name("stand")
                .with_position(Vec3::new(0.0, -1.5, 0.0)),
        );

        let mut mask = Scene::new();
        let blade_material = mask.add_material(white());
        let blade_group = mask.add(Object3D::group().with_name("blades"));
        let count = config.blade_count.max(1);
        for i in 0..count {
            let ring = RingGeometry::new(config.blade_inner_radius, config.blade_outer_radius, config.blade_segments)
                .with_sector(TAU / count as f32 * i as f32, config.blade_sweep.to_radians());
            mask.add_child(
                blade_group,
                Object3D::mesh(Arc::new(ring.build()), blade_material)
                    .with_name(format!("blade{}", i))
                    .with_position(Vec3::new(0.0, 0.0, config.blade_z)),
            );
        }

        let mut plane = Scene::new();
        plane.add_light(light());
        plane.add_light(AmbientLight::new(Color::WHITE, 1.0));
        let textured = plane.add_material(white().with_map(image));
        let plane_group = plane.add(Object3D::group().with_name("plane"));
        plane.add_child(
            plane_group,
            Object3D::mesh(
                Arc::new(PlaneGeometry::new(config.plane_size, config.plane_size).build()),
                textured,
            )
            .with_position(Vec3::new(0.0, 0.0, config.plane_z)),
        );

        let mut composer = EffectComposer::new(config.clear_color);
        composer
            .add_pass(Pass::Clear {
                color: config.clear_color,
            })
            .add_pass(Pass::Render {
                scene: FAN_CENTER_SCENE,
                clear: true,
            })
            .add_pass(Pass::Mask {
                scene: MASK_SCENE,
                inverse: false,
            })
            .add_pass(Pass::Render {
                scene: PLANE_SCENE,
                clear: false,
            })
            .add_pass(Pass::ClearMask)
            .add_pass(Pass::Effect(ScreenEffect::GAMMA));

        let mut camera = PerspectiveCamera::new(60.0, 1.0, 0.1, config.far);
        camera.set_position(config.camera_position);
        camera.look_at(Vec3::ZERO);

        Self {
            motion: config.motion,
            config,
            scenes: vec![fan_center, mask, plane],
            composer,
            camera,
            controls: OrbitControls::new(),
            blade_group,
            center_group,
            plane_group,
            spin: 0.0,
            yaw: 0.0,
        }
    }

    /// Spin and swing switches.
    pub fn motion(&self) -> &FanMotion {
        &self.motion
    }

    /// Scenes in composer order.
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Shared camera.
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// Accumulated blade rotation about z.
    pub fn spin(&self) -> f32 {
        self.spin
    }

    /// Current head rotation about y.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    fn apply_rotations(&mut self) {
        let (spin, yaw) = (self.spin, self.yaw);
        self.scenes[MASK_SCENE].transform_mut(self.blade_group).set_rotation(0.0, yaw, spin);
        self.scenes[FAN_CENTER_SCENE].transform_mut(self.center_group).set_rotation(0.0, yaw, 0.0);
        self.scenes[PLANE_SCENE].transform_mut(self.plane_group).set_rotation(0.0, yaw, 0.0);
    }
}

impl Demo for Fan {
    fn name(&self) -> &'static str {
        "fan"
    }

    fn setup(&self) -> Setup {
        Setup::Scene {
            clear_color: self.config.clear_color,
        }
    }

    fn update(&mut self, _time: FrameTime) {
        self.controls.update(&mut self.camera);

        let step = self.motion.advance(self.yaw);
        self.spin += step.spin;
        self.yaw = step.yaw;
        self.apply_rotations();
    }

    fn frame(&self) -> Frame<'_> {
        Frame::Composed {
            scenes: &self.scenes,
            composer: &self.composer,
            camera: &self.camera,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    fn drag(&mut self, dx: f32, dy: f32) {
        self.controls.rotate_by_pixels(dx, dy);
    }

    fn wheel(&mut self, delta: f32) {
        self.controls.zoom_by_wheel(delta);
    }

    fn trigger(&mut self, name: &str) -> bool {
        match name {
            "switch" => {
                let on = self.motion.toggle_running();
                log::debug!("fan running: {}", on);
                true
            }
            "swing" => {
                let on = self.motion.toggle_swinging();
                log::debug!("fan swinging: {}", on);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos::testing::{at, rasterize};
    use glam::Vec4;

    const SIZE: u32 = 64;

    fn fan() -> Fan {
        let mut fan = Fan::new(FanConfig::default(), Image::solid(Color::RED));
        fan.resize(SIZE, SIZE);
        fan.update(at(0.0));
        fan
    }

    fn pixel_of(fan: &Fan, world: Vec3) -> (u32, u32) {
        let clip = fan.camera().view_projection_matrix() * Vec4::new(world.x, world.y, world.z, 1.0);
        let ndc = clip / clip.w;
        let x = (ndc.x + 1.0) / 2.0 * SIZE as f32;
        let y = (1.0 - ndc.y) / 2.0 * SIZE as f32;
        (x as u32, y as u32)
    }

    fn on_circle(degrees: f32, radius: f32, z: f32) -> Vec3 {
        let a = degrees.to_radians();
        Vec3::new(a.cos() * radius, a.sin() * radius, z)
    }

    #[test]
    fn test_triggers_toggle_motion() {
        let mut fan = fan();
        assert!(!fan.motion().running);
        assert!(fan.trigger("switch"));
        assert!(fan.motion().running);
        assert!(fan.trigger("swing"));
        assert!(fan.motion().swinging);
        assert!(!fan.trigger("unknown"));
    }

    #[test]
    fn test_stopped_fan_stays_still() {
        let mut fan = fan();
        fan.trigger("swing");
        for i in 0..10 {
            fan.update(at(i as f64 / 60.0));
        }
        assert_eq!((fan.spin(), fan.yaw()), (0.0, 0.0));
    }

    #[test]
    fn test_running_fan_spins_and_swings_together() {
        let mut fan = fan();
        fan.trigger("switch");
        fan.update(at(0.1));
        assert!((fan.spin() - 0.3).abs() < 1e-6);
        assert_eq!(fan.yaw(), 0.0);

        fan.trigger("swing");
        fan.update(at(0.2));
        assert!((fan.yaw() - 0.01).abs() < 1e-6);

        let blades = fan.scenes()[MASK_SCENE].find_by_name("blades").unwrap();
        let plane = fan.scenes()[PLANE_SCENE].find_by_name("plane").unwrap();
        let center = fan.scenes()[FAN_CENTER_SCENE].find_by_name("center").unwrap();
        let blade_rotation = fan.scenes()[MASK_SCENE].object(blades).transform.rotation();
        assert!((blade_rotation.z - 0.6).abs() < 1e-5);
        assert_eq!(blade_rotation.y, fan.scenes()[PLANE_SCENE].object(plane).transform.rotation().y);
        assert_eq!(blade_rotation.y, fan.scenes()[FAN_CENTER_SCENE].object(center).transform.rotation().y);
    }

    #[test]
    fn test_scene_sizes() {
        let fan = fan();
        // group, hub, stand
        assert_eq!(fan.scenes()[FAN_CENTER_SCENE].len(), 3);
        // group and four blades
        assert_eq!(fan.scenes()[MASK_SCENE].len(), 5);
        // group and plane
        assert_eq!(fan.scenes()[PLANE_SCENE].len(), 2);
    }

    #[test]
    fn test_plane_shows_only_through_blades() {
        let fan = fan();
        let target = rasterize(&fan, SIZE, SIZE);

        let (x, y) = pixel_of(&fan, on_circle(15.0, 1.2, 0.26));
        assert_eq!(target.pixel(x, y), [1.0, 0.0, 0.0, 1.0]);

        let (x, y) = pixel_of(&fan, on_circle(60.0, 1.2, 0.25));
        let clear = Color::from_hex(0x111111).to_rgba(1.0);
        let expected = [
            ScreenEffect::GAMMA.apply(clear[0]),
            ScreenEffect::GAMMA.apply(clear[1]),
            ScreenEffect::GAMMA.apply(clear[2]),
            1.0,
        ];
        let actual = target.pixel(x, y);
        for k in 0..4 {
            assert!((actual[k] - expected[k]).abs() < 1e-5);
        }
    }
}
