//! Demo 04: pick a floor tile and the fox walks (or runs) to it.

use super::{Demo, Frame, Setup};
use crate::animation::{ActionId, AnimationMixer, BlendWeights, LoopMode, PoseBlend};
use crate::camera::PerspectiveCamera;
use crate::controls::OrbitControls;
use crate::core::{FrameTime, Result};
use crate::geometry::PlaneGeometry;
use crate::light::{AmbientLight, DirectionalLight, DirectionalShadow};
use crate::loaders::{fetch_bytes, GltfLoader, LoadError, LoadedModel};
use crate::material::Material;
use crate::math::{Color, Raycaster};
use crate::postprocessing::EffectComposer;
use crate::scene::{MaterialId, Object3D, ObjectId, Scene};
use crate::selection::{TileSelection, TileState};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

/// Fox constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoxConfig {
    /// glTF binary of the model.
    pub model_url: String,
    /// Uniform scale applied to the model.
    pub model_scale: f32,
    /// Tiles along x.
    pub tiles_x: usize,
    /// Tiles along z.
    pub tiles_z: usize,
    /// Side of one tile.
    pub tile_size: f32,
    /// Tile color when idle.
    pub tile_color: Color,
    /// Tile color under the pointer.
    pub hit_color: Color,
    /// Tile color once clicked.
    pub selected_color: Color,
    /// Walk/run blend and seek parameters.
    pub blend: PoseBlend,
    /// Position of the directional light.
    pub light_position: Vec3,
    /// Shadow camera of the directional light.
    pub shadow: DirectionalShadow,
    /// Initial camera position.
    pub camera_position: Vec3,
    /// Far clipping plane.
    pub far: f32,
    /// Background color.
    pub clear_color: Color,
}

impl Default for FoxConfig {
    fn default() -> Self {
        Self {
            model_url: "assets/obj/Fox.glb".into(),
            model_scale: 0.03,
            tiles_x: 30,
            tiles_z: 30,
            tile_size: 1.0,
            tile_color: Color::from_hex(0xcccccc),
            hit_color: Color::from_hex(0x00ffff),
            selected_color: Color::from_hex(0xff00ff),
            blend: PoseBlend::default(),
            light_position: Vec3::new(0.0, 12.0, 10.0),
            shadow: DirectionalShadow {
                size: 15.0,
                far: 50.0,
                ..DirectionalShadow::default()
            },
            camera_position: Vec3::new(0.0, 20.0, 20.0),
            far: 100.0,
            clear_color: Color::BLACK,
        }
    }
}

impl FoxConfig {
    /// Parse a configuration, filling missing fields from the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Copy)]
struct TileMaterials {
    idle: MaterialId,
    hit: MaterialId,
    selected: MaterialId,
}

impl TileMaterials {
    fn for_state(&self, state: TileState) -> MaterialId {
        match state {
            TileState::Default => self.idle,
            TileState::Hit => self.hit,
            TileState::Selected => self.selected,
        }
    }
}

/// Fox demo state.
pub struct Fox {
    config: FoxConfig,
    scenes: Vec<Scene>,
    composer: EffectComposer,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    raycaster: Raycaster,
    tiles: Vec<ObjectId>,
    materials: TileMaterials,
    selection: TileSelection,
    actor: ObjectId,
    nodes: Vec<ObjectId>,
    mixer: AnimationMixer,
    actions: Vec<ActionId>,
    weights: BlendWeights,
}

impl Fox {
    /// Fetch and parse the model, then build the demo.
    pub async fn load(config: FoxConfig) -> Result<Self> {
        let bytes = fetch_bytes(&config.model_url).await?;
        let model = GltfLoader::new()
            .load_from_bytes(&bytes)
            .map_err(|e| LoadError::with_source(e.message, config.model_url.as_str()))?;
        log::info!(
            "loaded {}: {} nodes, {} triangles, {} clips",
            config.model_url,
            model.nodes.len(),
            model.total_triangles(),
            model.clips.len()
        );
        Ok(Self::new(config, &model))
    }

    /// Build the demo around a parsed model.
    pub fn new(config: FoxConfig, model: &LoadedModel) -> Self {
        let mut scene = Scene::new();
        scene.add_light(DirectionalLight::new(Color::WHITE, 1.0, config.light_position).with_shadow(config.shadow));
        scene.add_light(AmbientLight::new(Color::WHITE, 0.1));

        let materials = TileMaterials {
            idle: scene.add_material(Material::phong(config.tile_color)),
            hit: scene.add_material(Material::phong(config.hit_color)),
            selected: scene.add_material(Material::phong(config.selected_color)),
        };

        let size = config.tile_size;
        let tile = Arc::new(PlaneGeometry::new(size, size).build());
        let half_x = config.tiles_x as f32 * size / 2.0;
        let half_z = config.tiles_z as f32 * size / 2.0;
        let tiles = (0..config.tiles_x * config.tiles_z)
            .map(|i| {
                let x = (i % config.tiles_x) as f32;
                let z = (i / config.tiles_x) as f32;
                let position = Vec3::new((x + 0.5) * size - half_x, 0.0, (z + 0.5) * size - half_z);
                scene.add(
                    Object3D::mesh(tile.clone(), materials.idle)
                        .with_position(position)
                        .with_rotation(-FRAC_PI_2, 0.0, 0.0)
                        .with_shadows(false, true),
                )
            })
            .collect();

        let mut actor = Object3D::group().with_name("fox");
        actor.transform.set_scale_uniform(config.model_scale);
        let actor = scene.add(actor);
        let nodes = model.instantiate(&mut scene, Some(actor));
        for id in scene.descendants(actor) {
            let object = scene.object_mut(id);
            object.cast_shadow = object.geometry().is_some();
        }

        let mut mixer = AnimationMixer::new();
        let actions: Vec<_> = model
            .clips
            .iter()
            .enumerate()
            .map(|(i, clip)| {
                let id = mixer.clip_action(clip.clone());
                if let Some(action) = mixer.action_mut(id) {
                    action.loop_mode = LoopMode::Repeat;
                    action.play();
                    action.set_weight(if i == 0 { 1.0 } else { 0.0 });
                }
                id
            })
            .collect();
        if actions.len() < 3 {
            log::warn!("model has {} clips, pose blending needs 3", actions.len());
        }

        let mut camera = PerspectiveCamera::new(60.0, 1.0, 0.1, config.far);
        camera.set_position(config.camera_position);
        camera.look_at(Vec3::ZERO);

        Self {
            composer: EffectComposer::single(0, config.clear_color),
            config,
            scenes: vec![scene],
            camera,
            controls: OrbitControls::new(),
            raycaster: Raycaster::new(),
            tiles,
            materials,
            selection: TileSelection::new(),
            actor,
            nodes,
            mixer,
            actions,
            weights: BlendWeights::IDLE,
        }
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scenes[0]
    }

    /// Shared camera.
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// Tiles, row-major with x varying fastest.
    pub fn tiles(&self) -> &[ObjectId] {
        &self.tiles
    }

    /// Hover and selection state.
    pub fn selection(&self) -> &TileSelection {
        &self.selection
    }

    /// Root object of the model.
    pub fn actor(&self) -> ObjectId {
        self.actor
    }

    /// Current clip weights.
    pub fn weights(&self) -> BlendWeights {
        self.weights
    }

    /// Animation mixer driving the model.
    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    fn refresh_tiles(&mut self) {
        let scene = &mut self.scenes[0];
        for &tile in &self.tiles {
            scene.set_material(tile, self.materials.for_state(self.selection.state_of(tile)));
        }
    }

    fn set_weights(&mut self, weights: BlendWeights) {
        self.weights = weights;
        for (&id, weight) in self.actions.iter().zip(weights.to_array()) {
            if let Some(action) = self.mixer.action_mut(id) {
                action.set_weight(weight);
            }
        }
    }

    fn seek(&mut self, tile: ObjectId) {
        let scene = &mut self.scenes[0];
        let target = scene.world_position(tile);
        let position = scene.object(self.actor).transform.position;
        let offset = target - position;
        let distance = offset.length();

        let weights = self.config.blend.weights(distance);
        let step = self.config.blend.step(distance);

        let transform = scene.transform_mut(self.actor);
        transform.position += offset.normalize_or_zero() * step;
        transform.look_at(target, Vec3::Y);

        self.set_weights(weights);
    }
}

impl Demo for Fox {
    fn name(&self) -> &'static str {
        "fox"
    }

    fn setup(&self) -> Setup {
        Setup::Scene {
            clear_color: self.config.clear_color,
        }
    }

    fn update(&mut self, time: FrameTime) {
        self.controls.update(&mut self.camera);

        self.mixer.update(time.delta_f32());
        if let Some(tile) = self.selection.selected() {
            self.seek(tile);
        }
        let pose = self.mixer.sample();
        pose.apply(&mut self.scenes[0], &self.nodes);
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

    fn pointer_move(&mut self, ndc: Vec2) {
        self.raycaster.set_from_camera(ndc, &self.camera);
        let hit = self
            .raycaster
            .intersect_objects(&self.scenes[0], &self.tiles)
            .first()
            .map(|hit| hit.object);
        self.selection.hover(hit);
        self.refresh_tiles();
    }

    fn click(&mut self, _now: f64) {
        if self.selection.click() {
            log::debug!("fox heading to tile {:?}", self.selection.selected());
        }
        self.refresh_tiles();
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
    use crate::animation::{AnimationClip, KeyframeTrack, TrackProperty, TrackValues};
    use crate::demos::testing::at;
    use crate::geometry::{Geometry, SkinVertex, Vertex};
    use crate::loaders::{LoadedMesh, LoadedNode, LoadedSkin};
    use crate::scene::Transform;
    use glam::Vec4;

    fn clip(name: &str, x: f32) -> Arc<AnimationClip> {
        let mut clip = AnimationClip::new(name);
        clip.add_track(KeyframeTrack::new(
            1,
            TrackProperty::Translation,
            vec![0.0, 1.0],
            TrackValues::Vector(vec![Vec3::new(x, 0.0, 0.0); 2]),
        ));
        Arc::new(clip)
    }

    fn body() -> Geometry {
        let rigid = SkinVertex::new([0; 4], [1.0, 0.0, 0.0, 0.0]);
        Geometry::new(
            vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0; 2]),
                Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0; 2]),
                Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0; 2]),
            ],
            vec![0, 1, 2],
        )
        .with_skin(vec![rigid; 3])
    }

    fn model() -> LoadedModel {
        let node = |name: &str, children, meshes| LoadedNode {
            name: name.into(),
            transform: Transform::new(),
            meshes,
            children,
            skin: None,
        };
        let mut skinned = node("body", vec![], vec![0]);
        skinned.skin = Some(0);
        LoadedModel {
            meshes: vec![LoadedMesh {
                name: "body".into(),
                geometry: Arc::new(body()),
                material: Material::standard(Color::WHITE),
            }],
            nodes: vec![node("root", vec![1, 2], vec![]), node("leg", vec![], vec![]), skinned],
            roots: vec![0],
            skins: vec![LoadedSkin {
                joints: vec![1],
                inverse_bind: vec![glam::Mat4::IDENTITY],
            }],
            clips: vec![clip("Survey", 0.0), clip("Walk", 1.0), clip("Run", 2.0)],
        }
    }

    fn skinned_positions(fox: &Fox) -> Vec<[f32; 3]> {
        let draws = fox.scene().visible_meshes();
        let draw = draws.iter().find(|d| d.is_skinned()).unwrap();
        let joints = draw.joints.as_ref().unwrap();
        draw.geometry.skinned_vertices(joints).iter().map(|v| v.position).collect()
    }

    fn fox() -> Fox {
        let mut fox = Fox::new(FoxConfig::default(), &model());
        fox.resize(100, 100);
        fox.update(at(0.0));
        fox
    }

    fn ndc_of(fox: &Fox, world: Vec3) -> Vec2 {
        let clip = fox.camera().view_projection_matrix() * Vec4::new(world.x, world.y, world.z, 1.0);
        Vec2::new(clip.x / clip.w, clip.y / clip.w)
    }

    fn tile_at(fox: &Fox, x: usize, z: usize) -> ObjectId {
        fox.tiles()[z * 30 + x]
    }

    #[test]
    fn test_tile_grid_layout() {
        let fox = fox();
        assert_eq!(fox.tiles().len(), 900);
        let first = fox.scene().world_position(tile_at(&fox, 0, 0));
        let last = fox.scene().world_position(tile_at(&fox, 29, 29));
        assert!((first - Vec3::new(-14.5, 0.0, -14.5)).length() < 1e-5);
        assert!((last - Vec3::new(14.5, 0.0, 14.5)).length() < 1e-5);
    }

    #[test]
    fn test_starts_idle_with_every_action_playing() {
        let fox = fox();
        assert_eq!(fox.weights(), BlendWeights::IDLE);
        let weights: Vec<f32> = fox.mixer().actions().iter().map(|a| a.effective_weight()).collect();
        assert_eq!(weights, vec![1.0, 0.0, 0.0]);
        assert!(fox.mixer().actions().iter().all(|a| a.is_playing()));
    }

    #[test]
    fn test_hover_then_click_selects_tile() {
        let mut fox = fox();
        let tile = tile_at(&fox, 20, 12);
        let ndc = ndc_of(&fox, fox.scene().world_position(tile));

        fox.pointer_move(ndc);
        assert_eq!(fox.selection().hovered(), Some(tile));
        assert_eq!(fox.selection().state_of(tile), TileState::Hit);
        assert_eq!(fox.scene().object(tile).material(), Some(fox.materials.hit));

        fox.click(0.0);
        assert_eq!(fox.selection().selected(), Some(tile));
        assert_eq!(fox.scene().object(tile).material(), Some(fox.materials.selected));

        // Hovering the selected tile keeps it selected.
        fox.pointer_move(ndc);
        assert_eq!(fox.selection().hovered(), None);
        assert_eq!(fox.scene().object(tile).material(), Some(fox.materials.selected));
    }

    #[test]
    fn test_click_on_empty_space_keeps_selection() {
        let mut fox = fox();
        let tile = tile_at(&fox, 3, 3);
        fox.pointer_move(ndc_of(&fox, fox.scene().world_position(tile)));
        fox.click(0.0);

        // Straight up from the camera, nothing but sky.
        fox.pointer_move(Vec2::new(0.0, 0.99));
        fox.click(0.0);
        assert_eq!(fox.selection().selected(), Some(tile));
    }

    #[test]
    fn test_actor_runs_then_walks_to_selected_tile() {
        let mut fox = fox();
        let tile = tile_at(&fox, 29, 15);
        let target = fox.scene().world_position(tile);
        fox.pointer_move(ndc_of(&fox, target));
        fox.click(0.0);

        fox.update(at(0.1));
        assert_eq!(fox.weights().to_array(), [0.0, 0.0, 1.0]);
        let moved = fox.scene().object(fox.actor()).transform.position;
        assert!((moved.length() - 0.5).abs() < 1e-4);

        let mut previous = target.distance(moved);
        for frame in 0..400 {
            fox.update(at(0.2 + frame as f64 / 60.0));
            let distance = target.distance(fox.scene().object(fox.actor()).transform.position);
            assert!(distance <= previous + 1e-5);
            previous = distance;
        }
        assert!(previous < 0.05);
        assert!(fox.weights().idle > 0.9);
    }

    #[test]
    fn test_actor_faces_target() {
        let mut fox = fox();
        let tile = tile_at(&fox, 25, 25);
        let target = fox.scene().world_position(tile);
        fox.pointer_move(ndc_of(&fox, target));
        fox.click(0.0);
        fox.update(at(0.1));

        let transform = &fox.scene().object(fox.actor()).transform;
        let forward = transform.quaternion() * Vec3::Z;
        let expected = (target - transform.position).normalize();
        assert!((forward - expected).length() < 1e-4);
    }

    #[test]
    fn test_running_pose_moves_skinned_vertices() {
        let mut fox = fox();
        let rest = skinned_positions(&fox);
        assert_eq!(rest, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);

        let tile = tile_at(&fox, 29, 15);
        fox.pointer_move(ndc_of(&fox, fox.scene().world_position(tile)));
        fox.click(0.0);
        fox.update(at(0.1));
        fox.update(at(0.2));

        // The run clip holds the leg joint at x = 2.
        for (posed, rest) in skinned_positions(&fox).iter().zip(&rest) {
            assert!((posed[0] - rest[0] - 2.0).abs() < 1e-4, "{:?} from {:?}", posed, rest);
            assert!((posed[1] - rest[1]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_model_casts_and_tiles_receive_shadows() {
        let fox = fox();
        let shadow = fox.scene().shadow_view().unwrap();
        assert_eq!(shadow.shadow.size, 15.0);
        assert_eq!(shadow.light_index, 0);

        let draws = fox.scene().visible_meshes();
        let (model, tiles): (Vec<_>, Vec<_>) = draws.iter().partition(|d| d.is_skinned());
        assert_eq!(model.len(), 1);
        assert!(model[0].cast_shadow && !model[0].receive_shadow);
        assert_eq!(tiles.len(), 900);
        assert!(tiles.iter().all(|d| d.receive_shadow && !d.cast_shadow));
    }

    #[test]
    fn test_pose_blends_clip_translations() {
        let mut fox = fox();
        let tile = tile_at(&fox, 29, 15);
        fox.pointer_move(ndc_of(&fox, fox.scene().world_position(tile)));
        fox.click(0.0);
        fox.update(at(0.1));
        fox.update(at(0.2));

        let leg = fox.nodes[1];
        let x = fox.scene().object(leg).transform.position.x;
        assert!((x - 2.0).abs() < 1e-5, "run clip only, got {}", x);
    }
}
