//! Demo 05: a pentagon of three colored triangles on the raw pipeline,
//! drawn with a selectable primitive topology.

use super::{Demo, Frame, RawFrame, RawSetup, Setup};
use crate::core::{FrameTime, Result};
use crate::math::Color;
use crate::raw::{pentagon, DrawMode, PipelineState, RawUniforms};
use serde::{Deserialize, Serialize};

/// Triangle constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangleConfig {
    /// Clear color.
    pub clear_color: Color,
    /// Initial primitive topology.
    pub mode: DrawMode,
    /// Start rendering as soon as the demo is up.
    pub autostart: bool,
}

impl Default for TriangleConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::splat(0.7),
            mode: DrawMode::Triangles,
            autostart: true,
        }
    }
}

impl TriangleConfig {
    /// Parse a configuration, filling missing fields from the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Raw pentagon demo state.
pub struct Triangle {
    config: TriangleConfig,
    mode: DrawMode,
    running: bool,
    started_at: Option<f64>,
    time: f32,
}

impl Triangle {
    /// Create the demo.
    pub fn new(config: TriangleConfig) -> Self {
        Self {
            mode: config.mode,
            running: config.autostart,
            started_at: None,
            time: 0.0,
            config,
        }
    }

    /// Active topology.
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// Seconds since the last start.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Resume rendering; the time uniform restarts from zero.
    pub fn start(&mut self) {
        self.running = true;
        self.started_at = None;
    }

    /// Stop rendering.
    pub fn stop(&mut self) {
        self.running = false;
    }
}

impl Demo for Triangle {
    fn name(&self) -> &'static str {
        "triangle"
    }

    fn setup(&self) -> Setup {
        Setup::Raw(RawSetup {
            label: "Triangle",
            vertex_shader: include_str!("shaders/triangle.vert.wgsl"),
            fragment_shader: include_str!("shaders/triangle.frag.wgsl"),
            mesh: pentagon(),
            clear_color: self.config.clear_color,
            square_viewport: true,
            textures: Vec::new(),
        })
    }

    fn update(&mut self, time: FrameTime) {
        if !self.running {
            return;
        }
        let start = *self.started_at.get_or_insert(time.elapsed);
        self.time = (time.elapsed - start).max(0.0) as f32;
    }

    fn frame(&self) -> Frame<'_> {
        Frame::Raw(RawFrame {
            uniforms: RawUniforms::with_time(self.time),
            state: PipelineState {
                mode: self.mode,
                culling: false,
                depth_test: false,
            },
            textures_visible: true,
        })
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn trigger(&mut self, name: &str) -> bool {
        match name {
            "start" => self.start(),
            "stop" => self.stop(),
            _ => return false,
        }
        true
    }

    fn select(&mut self, value: &str) -> Result<()> {
        let mode: DrawMode = value.parse()?;
        log::debug!("draw mode {} -> {}", self.mode, mode);
        self.mode = mode;
        Ok(())
    }

    fn is_rendering(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::demos::testing::at;
    use crate::raw::DrawModeError;

    #[test]
    fn test_setup_uses_square_viewport_and_pentagon() {
        let triangle = Triangle::new(TriangleConfig::default());
        let Setup::Raw(setup) = triangle.setup() else {
            panic!("expected raw setup");
        };
        assert!(setup.square_viewport);
        assert_eq!(setup.mesh.vertex_count(), 9);
        assert!(setup.textures.is_empty());
        assert!(setup.vertex_shader.contains("fn vs_main"));
        assert!(setup.fragment_shader.contains("fn fs_main"));
    }

    #[test]
    fn test_time_counts_from_first_frame() {
        let mut triangle = Triangle::new(TriangleConfig::default());
        triangle.update(at(3.0));
        assert_eq!(triangle.time(), 0.0);
        triangle.update(at(4.5));
        assert_eq!(triangle.time(), 1.5);
    }

    #[test]
    fn test_stop_freezes_and_start_restarts_time() {
        let mut triangle = Triangle::new(TriangleConfig::default());
        triangle.update(at(0.0));
        triangle.update(at(2.0));
        assert!(triangle.trigger("stop"));
        assert!(!triangle.is_rendering());
        triangle.update(at(5.0));
        assert_eq!(triangle.time(), 2.0);

        assert!(triangle.trigger("start"));
        triangle.update(at(6.0));
        assert_eq!(triangle.time(), 0.0);
        triangle.update(at(6.25));
        assert_eq!(triangle.time(), 0.25);
    }

    #[test]
    fn test_select_changes_mode() {
        let mut triangle = Triangle::new(TriangleConfig::default());
        triangle.select("LINE_STRIP").unwrap();
        assert_eq!(triangle.mode(), DrawMode::LineStrip);
        let Frame::Raw(frame) = triangle.frame() else {
            panic!("expected raw frame");
        };
        assert_eq!(frame.state.mode, DrawMode::LineStrip);
    }

    #[test]
    fn test_unknown_mode_keeps_previous() {
        let mut triangle = Triangle::new(TriangleConfig::default());
        triangle.select("POINTS").unwrap();
        let err = triangle.select("QUADS").unwrap_err();
        assert!(matches!(err, Error::DrawMode(DrawModeError::Unknown(_))));
        assert_eq!(triangle.mode(), DrawMode::Points);
    }

    #[test]
    fn test_every_selector_mode_is_accepted() {
        let mut triangle = Triangle::new(TriangleConfig::default());
        for name in ["LINE_LOOP", "TRIANGLE_FAN", "TRIANGLE_STRIP", "LINES"] {
            triangle.select(name).unwrap();
            assert_eq!(triangle.mode().name(), name);
        }
    }

    #[test]
    fn test_unknown_trigger_is_ignored() {
        let mut triangle = Triangle::new(TriangleConfig::default());
        assert!(!triangle.trigger("swing"));
        assert!(triangle.is_rendering());
    }
}
