//! Demo 01: a column of boxes circling inside a glass sleeve.

use super::{Demo, Frame, Setup};
use crate::animation::{OrbitPattern, OrbitSlot};
use crate::camera::PerspectiveCamera;
use crate::controls::OrbitControls;
use crate::core::{FrameTime, Result};
use crate::geometry::BoxGeometry;
use crate::light::{AmbientLight, DirectionalLight};
use crate::material::Material;
use crate::math::Color;
use crate::postprocessing::EffectComposer;
use crate::scene::{Object3D, ObjectId, Scene};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tower constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerConfig {
    /// Number of box rows.
    pub rows: usize,
    /// Orbit of every box.
    pub orbit: OrbitPattern,
    /// Box colors by position within a row.
    pub box_colors: Vec<Color>,
    /// Color of the end plates.
    pub plate_color: Color,
    /// Opacity of the sleeve.
    pub sleeve_opacity: f32,
    /// Initial camera position.
    pub camera_position: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Largest orbit-control distance.
    pub max_distance: f32,
    /// Background color.
    pub clear_color: Color,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            rows: 33,
            orbit: OrbitPattern::default(),
            box_colors: vec![Color::from_hex(0xee0000), Color::from_hex(0x0000ee), Color::WHITE],
            plate_color: Color::BLACK,
            sleeve_opacity: 0.25,
            camera_position: Vec3::new(30.0, 0.0, 30.0),
            fov: 60.0,
            far: 100.0,
            max_distance: 50.0,
            clear_color: Color::from_hex(0xa9ceec),
        }
    }
}

impl TowerConfig {
    /// Parse a configuration, filling missing fields from the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Orbiting box column.
pub struct Tower {
    config: TowerConfig,
    scenes: Vec<Scene>,
    composer: EffectComposer,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    boxes: Vec<(OrbitSlot, ObjectId)>,
}

impl Tower {
    /// Build the scene.
    pub fn new(config: TowerConfig) -> Self {
        let mut scene = Scene::new();
        scene.add_light(DirectionalLight::new(Color::WHITE, 1.0, Vec3::new(0.0, 10.0, 5.0)));
        scene.add_light(AmbientLight::new(Color::WHITE, 0.4));

        let colors = if config.box_colors.is_empty() {
            vec![Color::WHITE]
        } else {
            config.box_colors.clone()
        };
        let materials: Vec<_> = colors.iter().map(|&color| scene.add_material(Material::phong(color))).collect();
        let cube = Arc::new(BoxGeometry::cube(1.0).build());

        let mut orbit = config.orbit;
        orbit.per_row = materials.len();
        let boxes = orbit
            .slots(config.rows)
            .into_iter()
            .map(|slot| {
                let cube = Object3D::mesh(cube.clone(), materials[slot.sub_index]);
                (slot, scene.add(cube.with_position(orbit.position(&slot, 0.0))))
            })
            .collect();

        let n = config.rows as f32;
        let plate = Arc::new(BoxGeometry::new(6.0, 1.0, 6.0).build());
        let plate_material = scene.add_material(Material::phong(config.plate_color));
        for y in [(n + 1.0) / 2.0, -(n + 1.0) / 2.0] {
            scene.add(
                Object3D::mesh(plate.clone(), plate_material)
                    .with_name("plate")
                    .with_position(Vec3::new(0.0, y, 0.0)),
            );
        }

        let sleeve_material = scene.add_material(Material::standard(Color::WHITE).with_opacity(config.sleeve_opacity));
        scene.add(Object3D::mesh(Arc::new(BoxGeometry::new(5.0, n, 5.0).build()), sleeve_material).with_name("sleeve"));

        let mut camera = PerspectiveCamera::new(config.fov, 1.0, 0.1, config.far);
        camera.set_position(config.camera_position);
        camera.look_at(Vec3::ZERO);

        let mut controls = OrbitControls::new();
        controls.max_distance = config.max_distance;

        log::debug!("tower: {} boxes in {} rows", config.rows * orbit.per_row, config.rows);

        Self {
            composer: EffectComposer::single(0, config.clear_color),
            config: TowerConfig { orbit, ..config },
            scenes: vec![scene],
            camera,
            controls,
            boxes,
        }
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scenes[0]
    }

    /// Box meshes with their orbit slots.
    pub fn boxes(&self) -> &[(OrbitSlot, ObjectId)] {
        &self.boxes
    }
}

impl Demo for Tower {
    fn name(&self) -> &'static str {
        "tower"
    }

    fn setup(&self) -> Setup {
        Setup::Scene {
            clear_color: self.config.clear_color,
        }
    }

    fn update(&mut self, time: FrameTime) {
        self.controls.update(&mut self.camera);

        let t = time.elapsed_f32();
        let orbit = self.config.orbit;
        let scene = &mut self.scenes[0];
        for (slot, id) in &self.boxes {
            let transform = scene.transform_mut(*id);
            transform.position = orbit.position(slot, t);
            let r = orbit.rotation(slot, t);
            transform.set_rotation(r.x, r.y, r.z);
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos::testing::{at, rasterize};

    #[test]
    fn test_builds_three_boxes_per_row() {
        let tower = Tower::new(TowerConfig::default());
        assert_eq!(tower.boxes().len(), 99);
        // boxes, two plates and the sleeve
        assert_eq!(tower.scene().len(), 99 + 3);
    }

    #[test]
    fn test_rows_are_centered() {
        let tower = Tower::new(TowerConfig::default());
        let (top, _) = tower.boxes()[0];
        let (bottom, _) = tower.boxes()[98];
        assert_eq!(top.y, 16.0);
        assert_eq!(bottom.y, -16.0);
    }

    #[test]
    fn test_boxes_start_on_their_circle() {
        let tower = Tower::new(TowerConfig::default());
        let (_, first) = tower.boxes()[0];
        let p = tower.scene().object(first).transform.position;
        assert!((p - Vec3::new(1.0, 16.0, 0.0)).length() < 1e-5);

        let (_, second) = tower.boxes()[1];
        let angle = std::f32::consts::TAU / 3.0;
        let p = tower.scene().object(second).transform.position;
        assert!((p - Vec3::new(angle.cos(), 16.0, angle.sin())).length() < 1e-5);
    }

    #[test]
    fn test_sleeve_is_translucent_standard() {
        let tower = Tower::new(TowerConfig::default());
        let scene = tower.scene();
        let sleeve = scene.find_by_name("sleeve").unwrap();
        let material = scene.material(scene.object(sleeve).material().unwrap());
        assert_eq!(material.shading, crate::material::Shading::Standard);
        assert!(material.transparent);
        assert_eq!(material.opacity, 0.25);
    }

    #[test]
    fn test_boxes_follow_orbit() {
        let mut tower = Tower::new(TowerConfig::default());
        tower.update(at(0.4));
        let timer = 0.4f32 * 2.5;
        for &(slot, id) in tower.boxes().iter().take(6) {
            let angle = slot.row as f32 + std::f32::consts::TAU / 3.0 * slot.sub_index as f32 + timer;
            let p = tower.scene().object(id).transform.position;
            assert!((p - Vec3::new(angle.cos(), slot.y, angle.sin())).length() < 1e-4);
            let r = tower.scene().object(id).transform.rotation();
            assert_eq!(r, Vec3::new(timer + slot.row as f32, timer + slot.row as f32, 0.0));
        }
    }

    #[test]
    fn test_background_fills_corners() {
        let mut tower = Tower::new(TowerConfig::default());
        tower.resize(32, 32);
        tower.update(at(0.0));
        let target = rasterize(&tower, 32, 32);
        assert_eq!(target.pixel(0, 0), Color::from_hex(0xa9ceec).to_rgba(1.0));
    }
}
