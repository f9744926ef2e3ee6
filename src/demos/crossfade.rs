//! Demo 07: a textured plane that cross-fades between two images on click.

use super::{Demo, Frame, RawFrame, RawSetup, Setup};
use crate::animation::ProgressRamp;
use crate::camera::PerspectiveCamera;
use crate::controls::OrbitControls;
use crate::core::{FrameTime, Result};
use crate::loaders::load_image;
use crate::math::Color;
use crate::raw::{plane, DrawMode, PipelineState, RawUniforms};
use crate::texture::Image;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Crossfade constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossfadeConfig {
    /// Image on texture unit 0.
    pub from_url: String,
    /// Image on texture unit 1.
    pub to_url: String,
    /// Side of the plane.
    pub plane_size: f32,
    /// Vertex color of the plane.
    pub plane_color: Color,
    /// Duration of one fade in seconds.
    pub fade_seconds: f64,
    /// Initial camera distance.
    pub distance: f32,
    /// Closest orbit distance.
    pub min_distance: f32,
    /// Farthest orbit distance.
    pub max_distance: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Clear color.
    pub clear_color: Color,
    /// Cull back faces at start.
    pub culling: bool,
    /// Depth test at start.
    pub depth_test: bool,
}

impl Default for CrossfadeConfig {
    fn default() -> Self {
        Self {
            from_url: "assets/img/img01.png".into(),
            to_url: "assets/img/img02.png".into(),
            plane_size: 2.0,
            plane_color: Color::WHITE,
            fade_seconds: 0.6,
            distance: 5.0,
            min_distance: 1.0,
            max_distance: 10.0,
            fov: 45.0,
            near: 0.1,
            far: 10.0,
            clear_color: Color::splat(0.3),
            culling: false,
            depth_test: true,
        }
    }
}

impl CrossfadeConfig {
    /// Parse a configuration, filling missing fields from the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Crossfade demo state.
pub struct Crossfade {
    config: CrossfadeConfig,
    images: [Arc<Image>; 2],
    camera: PerspectiveCamera,
    controls: OrbitControls,
    ramp: ProgressRamp,
    state: PipelineState,
    textures_visible: bool,
    time: f32,
}

impl Crossfade {
    /// Fetch both images and build the demo.
    pub async fn load(config: CrossfadeConfig) -> Result<Self> {
        let from = load_image(&config.from_url).await?;
        let to = load_image(&config.to_url).await?;
        Ok(Self::new(config, [from, to]))
    }

    /// Build the demo around already decoded images.
    pub fn new(config: CrossfadeConfig, images: [Arc<Image>; 2]) -> Self {
        let mut camera = PerspectiveCamera::new(config.fov, 1.0, config.near, config.far);
        camera.set_position(Vec3::new(0.0, 0.0, config.distance));
        camera.look_at(Vec3::ZERO);

        Self {
            images,
            camera,
            controls: OrbitControls::with_distance(config.min_distance, config.max_distance),
            ramp: ProgressRamp::new(config.fade_seconds),
            state: PipelineState {
                mode: DrawMode::Triangles,
                culling: config.culling,
                depth_test: config.depth_test,
            },
            textures_visible: true,
            time: 0.0,
            config,
        }
    }

    /// Cull back faces.
    pub fn set_culling(&mut self, enabled: bool) {
        self.state.culling = enabled;
    }

    /// Depth test and write.
    pub fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
    }

    /// Bind the images, or black when hidden.
    pub fn set_texture_visibility(&mut self, visible: bool) {
        self.textures_visible = visible;
    }

    /// Fixed-function state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Fade progress.
    pub fn ramp(&self) -> &ProgressRamp {
        &self.ramp
    }

    /// Orbit camera.
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }
}

impl Demo for Crossfade {
    fn name(&self) -> &'static str {
        "crossfade"
    }

    fn setup(&self) -> Setup {
        let c = self.config.plane_color.to_rgba(1.0);
        Setup::Raw(RawSetup {
            label: "Crossfade",
            vertex_shader: include_str!("shaders/crossfade.vert.wgsl"),
            fragment_shader: include_str!("shaders/crossfade.frag.wgsl"),
            mesh: plane(self.config.plane_size, self.config.plane_size, c),
            clear_color: self.config.clear_color,
            square_viewport: false,
            textures: self.images.to_vec(),
        })
    }

    fn update(&mut self, time: FrameTime) {
        self.controls.update(&mut self.camera);
        self.ramp.update(time.elapsed);
        self.time = time.elapsed_f32();
    }

    fn frame(&self) -> Frame<'_> {
        Frame::Raw(RawFrame {
            uniforms: RawUniforms::new(
                Mat4::IDENTITY,
                self.camera.view_projection_matrix(),
                self.time,
                self.ramp.value(),
            ),
            state: self.state,
            textures_visible: self.textures_visible,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    fn click(&mut self, now: f64) {
        if !self.ramp.trigger(now) {
            log::debug!("fade already running");
        }
    }

    fn drag(&mut self, dx: f32, dy: f32) {
        self.controls.rotate_by_pixels(dx, dy);
    }

    fn wheel(&mut self, delta: f32) {
        self.controls.zoom_by_wheel(delta);
    }

    fn trigger(&mut self, name: &str) -> bool {
        match name {
            "culling" => self.set_culling(!self.state.culling),
            "depth-test" => self.set_depth_test(!self.state.depth_test),
            "texture" => self.set_texture_visibility(!self.textures_visible),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos::testing::at;

    fn crossfade() -> Crossfade {
        let mut demo = Crossfade::new(
            CrossfadeConfig::default(),
            [Image::solid(Color::RED), Image::solid(Color::BLUE)],
        );
        demo.resize(200, 100);
        demo.update(at(0.0));
        demo
    }

    fn progress(demo: &Crossfade) -> f32 {
        match demo.frame() {
            Frame::Raw(frame) => frame.uniforms.progress,
            Frame::Composed { .. } => panic!("expected raw frame"),
        }
    }

    #[test]
    fn test_setup_binds_two_textures() {
        let demo = crossfade();
        let Setup::Raw(setup) = demo.setup() else {
            panic!("expected raw setup");
        };
        assert_eq!(setup.textures.len(), 2);
        assert_eq!(setup.mesh.element_count(), 6);
        assert_eq!(setup.mesh.attribute("texCoord").map(|a| a.stride()), Some(2));
        assert!(!setup.square_viewport);
    }

    #[test]
    fn test_click_fades_forward_then_back() {
        let mut demo = crossfade();
        demo.click(1.0);
        demo.update(at(1.3));
        assert!((progress(&demo) - 0.5).abs() < 1e-4);
        demo.update(at(1.7));
        assert_eq!(progress(&demo), 1.0);
        assert!(!demo.ramp().is_running());

        demo.click(2.0);
        demo.update(at(2.15));
        assert!((progress(&demo) - 0.75).abs() < 1e-4);
        demo.update(at(3.0));
        assert_eq!(progress(&demo), 0.0);
    }

    #[test]
    fn test_click_during_fade_is_ignored() {
        let mut demo = crossfade();
        demo.click(0.0);
        demo.update(at(0.3));
        demo.click(0.3);
        demo.update(at(0.6));
        assert_eq!(progress(&demo), 1.0);
        assert!(demo.ramp().is_reversed());
    }

    #[test]
    fn test_setters_reach_the_frame() {
        let mut demo = crossfade();
        demo.set_culling(true);
        demo.set_depth_test(false);
        demo.set_texture_visibility(false);
        let Frame::Raw(frame) = demo.frame() else {
            panic!("expected raw frame");
        };
        assert!(frame.state.culling);
        assert!(!frame.state.depth_test);
        assert!(!frame.textures_visible);

        assert!(demo.trigger("texture"));
        assert!(demo.trigger("culling"));
        assert!(!demo.trigger("swing"));
        assert!(!demo.state().culling);
    }

    #[test]
    fn test_mvp_projects_plane_center_to_screen_center() {
        let demo = crossfade();
        let Frame::Raw(frame) = demo.frame() else {
            panic!("expected raw frame");
        };
        let mvp = Mat4::from_cols_array_2d(&frame.uniforms.mvp);
        let clip = mvp * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-5);
        assert!((clip.y / clip.w).abs() < 1e-5);
        assert!(demo.camera().distance_to_target() > 4.99);
    }
}
