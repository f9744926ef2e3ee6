//! Demo 03: swarms of cones chasing a light around a tilted earth.

use super::{Demo, Frame, Setup};
use crate::animation::{ChaseCurve, ChaseSwarm};
use crate::camera::PerspectiveCamera;
use crate::controls::OrbitControls;
use crate::core::{FrameTime, Result};
use crate::geometry::{CylinderGeometry, SphereGeometry};
use crate::light::{AmbientLight, DirectionalLight, Light, PointLight};
use crate::loaders::load_image;
use crate::material::Material;
use crate::math::Color;
use crate::postprocessing::EffectComposer;
use crate::scene::{Fog, LightId, Object3D, ObjectId, Scene};
use crate::texture::Image;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One chasing swarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Path of the lead light.
    pub curve: ChaseCurve,
    /// Cone and light color.
    pub color: Color,
    /// Number of cones.
    pub count: usize,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            curve: ChaseCurve::CosSinSin2,
            color: Color::YELLOW,
            count: 33,
        }
    }
}

/// Globe constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    /// Earth texture.
    pub image_url: String,
    /// Swarms in draw order.
    pub swarms: Vec<SwarmConfig>,
    /// Earth radius.
    pub earth_radius: f32,
    /// Radius the lead light travels at.
    pub chase_radius: f32,
    /// Height of the cones above the light.
    pub altitude: f32,
    /// Time gap between consecutive cones.
    pub spacing: f32,
    /// Axial tilt in degrees.
    pub tilt: f32,
    /// Initial camera position.
    pub camera_position: Vec3,
    /// Far clipping plane.
    pub far: f32,
    /// Distance where fog starts.
    pub fog_near: f32,
    /// Distance where fog is opaque.
    pub fog_far: f32,
    /// Point light intensity.
    pub light_intensity: f32,
    /// Point light cutoff distance.
    pub light_distance: f32,
    /// Point light decay exponent.
    pub light_decay: f32,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self::single()
    }
}

impl GlobeConfig {
    /// One yellow swarm.
    pub fn single() -> Self {
        Self {
            image_url: "assets/img/earth.jpg".into(),
            swarms: vec![SwarmConfig::default()],
            earth_radius: 3.0,
            chase_radius: 3.01,
            altitude: 0.5,
            spacing: 0.1,
            tilt: 23.4,
            camera_position: Vec3::new(0.0, 2.0, 10.0),
            far: 30.0,
            fog_near: 10.0,
            fog_far: 20.0,
            light_intensity: 2.0,
            light_distance: 50.0,
            light_decay: 1.0,
        }
    }

    /// Yellow, cyan and magenta swarms on three different curves.
    pub fn triple() -> Self {
        let swarm = |curve, color| SwarmConfig {
            curve,
            color,
            ..SwarmConfig::default()
        };
        Self {
            swarms: vec![
                swarm(ChaseCurve::CosSinSin2, Color::YELLOW),
                swarm(ChaseCurve::Sin2CosSin, Color::CYAN),
                swarm(ChaseCurve::SinSin2Cos, Color::MAGENTA),
            ],
            ..Self::single()
        }
    }

    /// Parse a configuration, filling missing fields from the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

struct Swarm {
    chase: ChaseSwarm,
    light: LightId,
    cones: Vec<ObjectId>,
}

/// Globe demo state.
pub struct Globe {
    scenes: Vec<Scene>,
    composer: EffectComposer,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    earth: ObjectId,
    swarms: Vec<Swarm>,
}

impl Globe {
    /// Fetch the earth texture and build the demo.
    pub async fn load(config: GlobeConfig) -> Result<Self> {
        let image = load_image(&config.image_url).await?;
        Ok(Self::new(config, image))
    }

    /// Build the demo around an already decoded earth texture.
    pub fn new(config: GlobeConfig, earth_map: Arc<Image>) -> Self {
        let mut scene = Scene::new();
        scene.fog = Fog::Linear {
            color: Color::BLACK,
            near: config.fog_near,
            far: config.fog_far,
        };
        scene.add_light(DirectionalLight::new(Color::WHITE, 0.2, Vec3::ONE));
        scene.add_light(AmbientLight::new(Color::from_hex(0xaaaaaa), 0.01));

        let group = scene.add(Object3D::group().with_name("globe").with_rotation(0.0, 0.0, -config.tilt.to_radians()));
        let earth_material = scene.add_material(Material::phong(Color::WHITE).with_map(earth_map));
        let earth = scene.add_child(
            group,
            Object3D::mesh(Arc::new(SphereGeometry::new(config.earth_radius, 32, 32).build()), earth_material)
                .with_name("earth"),
        );

        let cone = Arc::new(CylinderGeometry::cone(0.1, 0.25, 32).build());
        let swarms = config
            .swarms
            .iter()
            .map(|swarm| {
                let mut light = PointLight::new(swarm.color, config.light_intensity, config.light_distance, config.light_decay);
                light.set_position(Vec3::new(0.0, 0.0, 5.0));
                let light = scene.add_light(light);
                let material = scene.add_material(Material::basic(swarm.color));
                let cones = (0..swarm.count)
                    .map(|_| scene.add(Object3D::mesh(cone.clone(), material)))
                    .collect();
                Swarm {
                    chase: ChaseSwarm::new(
                        swarm.curve,
                        swarm.count,
                        config.chase_radius,
                        config.altitude,
                        config.spacing,
                        Vec3::Y,
                    ),
                    light,
                    cones,
                }
            })
            .collect();

        let mut camera = PerspectiveCamera::new(60.0, 1.0, 0.1, config.far);
        camera.set_position(config.camera_position);
        camera.look_at(Vec3::ZERO);

        Self {
            scenes: vec![scene],
            composer: EffectComposer::single(0, Color::BLACK),
            camera,
            controls: OrbitControls::new(),
            earth,
            swarms,
        }
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scenes[0]
    }

    /// Chase state of every swarm.
    pub fn swarms(&self) -> impl Iterator<Item = &ChaseSwarm> {
        self.swarms.iter().map(|s| &s.chase)
    }
}

impl Demo for Globe {
    fn name(&self) -> &'static str {
        if self.swarms.len() > 1 {
            "globe-triple"
        } else {
            "globe"
        }
    }

    fn setup(&self) -> Setup {
        Setup::Scene {
            clear_color: Color::BLACK,
        }
    }

    fn update(&mut self, time: FrameTime) {
        self.controls.update(&mut self.camera);

        let t = time.elapsed_f32();
        let scene = &mut self.scenes[0];
        for swarm in &mut self.swarms {
            swarm.chase.update(t);
            if let Light::Point(light) = scene.light_mut(swarm.light) {
                light.set_position(swarm.chase.light_position(t));
            }
            for (follower, &cone) in swarm.chase.followers().iter().zip(&swarm.cones) {
                let transform = scene.transform_mut(cone);
                transform.position = follower.position;
                transform.set_quaternion(follower.orientation);
            }
        }
        scene.transform_mut(self.earth).set_rotation(0.0, -t / 10.0, 0.0);
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
}
