//! Frame driver: ties a [`Demo`] to a GPU context and a renderer.
//!
//! The host feeds timestamps and input events in canvas pixels; the app
//! runs clock → demo update → render each frame and recovers from lost
//! surfaces.

use crate::core::{Clock, Context, FrameTime, RenderConfig, Result, SceneRenderer};
use crate::demos::{Demo, Frame, RawSetup, Setup};
use crate::raw::{RawMesh, RawRenderer, ShaderProgram};
use crate::selection::pointer_to_ndc;
use crate::texture::Texture2D;
use glam::Vec2;

/// GPU side chosen from [`Demo::setup`].
pub enum Backend {
    /// Scene graph through the effect composer.
    Scene(SceneRenderer),
    /// Single raw mesh.
    Raw(RawRenderer),
}

impl Backend {
    async fn new(ctx: &Context, setup: Setup) -> Result<Self> {
        Ok(match setup {
            Setup::Scene { clear_color } => {
                Backend::Scene(SceneRenderer::new(ctx, RenderConfig::default().with_clear_color(clear_color)))
            }
            Setup::Raw(setup) => Backend::Raw(raw_renderer(ctx, setup).await?),
        })
    }

    fn resize(&mut self, ctx: &Context) {
        match self {
            Backend::Scene(renderer) => renderer.resize(ctx),
            Backend::Raw(renderer) => renderer.resize(ctx),
        }
    }
}

async fn raw_renderer(ctx: &Context, setup: RawSetup) -> Result<RawRenderer> {
    let program = ShaderProgram::compile(&ctx.device, setup.label, setup.vertex_shader, setup.fragment_shader).await?;
    let mesh = RawMesh::upload(&ctx.device, setup.label, &setup.mesh);
    let mut renderer = RawRenderer::new(ctx, program, mesh, setup.clear_color);
    renderer.set_square_viewport(setup.square_viewport);
    for (unit, image) in setup.textures.iter().enumerate() {
        renderer.set_texture(unit, Texture2D::from_image(&ctx.device, &ctx.queue, image));
    }
    Ok(renderer)
}

/// Primary-button drag tracking in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragTracker {
    last: Option<Vec2>,
}

impl DragTracker {
    /// Button went down at `position`.
    pub fn press(&mut self, position: Vec2) {
        self.last = Some(position);
    }

    /// Button went up.
    pub fn release(&mut self) {
        self.last = None;
    }

    /// Pointer moved; returns the delta while the button is held.
    pub fn moved(&mut self, position: Vec2) -> Option<Vec2> {
        let last = self.last.replace(position)?;
        Some(position - last)
    }

    /// Whether the button is held.
    pub fn is_dragging(&self) -> bool {
        self.last.is_some()
    }
}

/// A demo bound to a drawing surface.
pub struct App<D: Demo> {
    ctx: Context,
    backend: Backend,
    demo: D,
    clock: Clock,
    drag: DragTracker,
}

impl<D: Demo> App<D> {
    /// Create the renderer the demo asks for and size the demo to the surface.
    pub async fn new(ctx: Context, mut demo: D) -> Result<Self> {
        let backend = Backend::new(&ctx, demo.setup()).await?;
        demo.resize(ctx.width, ctx.height);
        log::info!("{} running at {}x{}", demo.name(), ctx.width, ctx.height);
        Ok(Self {
            ctx,
            backend,
            demo,
            clock: Clock::new(),
            drag: DragTracker::default(),
        })
    }

    /// The demo.
    pub fn demo(&self) -> &D {
        &self.demo
    }

    /// The demo, mutably.
    pub fn demo_mut(&mut self) -> &mut D {
        &mut self.demo
    }

    /// GPU context.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Advance to host time `now` (seconds) and render, unless the demo
    /// is paused.
    pub fn frame(&mut self, now: f64) -> Option<FrameTime> {
        if !self.demo.is_rendering() {
            return None;
        }
        let time = self.clock.tick(now);
        self.demo.update(time);

        if let Err(err) = self.render() {
            match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    log::warn!("surface {:?}, reconfiguring", err);
                    let (width, height) = (self.ctx.width, self.ctx.height);
                    self.resize(width, height);
                }
                wgpu::SurfaceError::Timeout => log::warn!("surface timeout, skipping frame"),
                wgpu::SurfaceError::OutOfMemory => log::error!("out of GPU memory"),
            }
        }
        Some(time)
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        match (&mut self.backend, self.demo.frame()) {
            (
                Backend::Scene(renderer),
                Frame::Composed {
                    scenes,
                    composer,
                    camera,
                },
            ) => {
                let mut frame = renderer.begin_frame(&self.ctx)?;
                if let Err(err) = composer.render(scenes, camera, &mut frame) {
                    log::error!("composer: {}", err);
                }
                frame.present();
            }
            (Backend::Raw(renderer), Frame::Raw(raw)) => {
                renderer.set_draw_mode(raw.state.mode);
                renderer.set_culling(raw.state.culling);
                renderer.set_depth_test(raw.state.depth_test);
                renderer.set_texture_visibility(raw.textures_visible);
                renderer.render(&self.ctx, &raw.uniforms)?;
            }
            _ => log::warn!("{} produced a frame for the other backend", self.demo.name()),
        }
        Ok(())
    }

    /// The canvas changed size (pixels).
    pub fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
        self.backend.resize(&self.ctx);
        self.demo.resize(self.ctx.width, self.ctx.height);
    }

    /// Primary button pressed at canvas pixel `(x, y)`.
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.drag.press(Vec2::new(x, y));
    }

    /// Primary button released.
    pub fn pointer_up(&mut self) {
        self.drag.release();
    }

    /// Pointer moved to canvas pixel `(x, y)`.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some(delta) = self.drag.moved(Vec2::new(x, y)) {
            self.demo.drag(delta.x, delta.y);
        }
        let ndc = pointer_to_ndc(x, y, self.ctx.width as f32, self.ctx.height as f32);
        self.demo.pointer_move(ndc);
    }

    /// Primary click.
    pub fn click(&mut self) {
        self.demo.click(self.clock.elapsed_time());
    }

    /// Wheel scrolled by `delta` pixels.
    pub fn wheel(&mut self, delta: f32) {
        self.demo.wheel(delta);
    }

    /// Named UI action.
    pub fn trigger(&mut self, name: &str) -> bool {
        let known = self.demo.trigger(name);
        if !known {
            log::debug!("{} ignores trigger '{}'", self.demo.name(), name);
        }
        known
    }

    /// Value from the select control.
    pub fn select(&mut self, value: &str) -> Result<()> {
        self.demo.select(value)
    }
}

/// Object-safe view of an [`App`], for hosts that pick the demo at runtime.
pub trait Runner {
    /// Demo name.
    fn name(&self) -> &'static str;
    /// See [`App::frame`].
    fn frame(&mut self, now: f64) -> Option<FrameTime>;
    /// See [`App::resize`].
    fn resize(&mut self, width: u32, height: u32);
    /// See [`App::pointer_down`].
    fn pointer_down(&mut self, x: f32, y: f32);
    /// See [`App::pointer_up`].
    fn pointer_up(&mut self);
    /// See [`App::pointer_move`].
    fn pointer_move(&mut self, x: f32, y: f32);
    /// See [`App::click`].
    fn click(&mut self);
    /// See [`App::wheel`].
    fn wheel(&mut self, delta: f32);
    /// See [`App::trigger`].
    fn trigger(&mut self, name: &str) -> bool;
    /// See [`App::select`].
    fn select(&mut self, value: &str) -> Result<()>;
}

impl<D: Demo> Runner for App<D> {
    fn name(&self) -> &'static str {
        self.demo.name()
    }

    fn frame(&mut self, now: f64) -> Option<FrameTime> {
        App::frame(self, now)
    }

    fn resize(&mut self, width: u32, height: u32) {
        App::resize(self, width, height)
    }

    fn pointer_down(&mut self, x: f32, y: f32) {
        App::pointer_down(self, x, y)
    }

    fn pointer_up(&mut self) {
        App::pointer_up(self)
    }

    fn pointer_move(&mut self, x: f32, y: f32) {
        App::pointer_move(self, x, y)
    }

    fn click(&mut self) {
        App::click(self)
    }

    fn wheel(&mut self, delta: f32) {
        App::wheel(self, delta)
    }

    fn trigger(&mut self, name: &str) -> bool {
        App::trigger(self, name)
    }

    fn select(&mut self, value: &str) -> Result<()> {
        App::select(self, value)
    }
}

impl<D: Demo + ?Sized> Demo for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn setup(&self) -> Setup {
        (**self).setup()
    }

    fn update(&mut self, time: FrameTime) {
        (**self).update(time)
    }

    fn frame(&self) -> Frame<'_> {
        (**self).frame()
    }

    fn resize(&mut self, width: u32, height: u32) {
        (**self).resize(width, height)
    }

    fn pointer_move(&mut self, ndc: Vec2) {
        (**self).pointer_move(ndc)
    }

    fn click(&mut self, now: f64) {
        (**self).click(now)
    }

    fn drag(&mut self, dx: f32, dy: f32) {
        (**self).drag(dx, dy)
    }

    fn wheel(&mut self, delta: f32) {
        (**self).wheel(delta)
    }

    fn trigger(&mut self, name: &str) -> bool {
        (**self).trigger(name)
    }

    fn select(&mut self, value: &str) -> Result<()> {
        (**self).select(value)
    }

    fn is_rendering(&self) -> bool {
        (**self).is_rendering()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos::{Triangle, TriangleConfig};

    #[test]
    fn test_drag_reports_deltas_only_while_pressed() {
        let mut drag = DragTracker::default();
        assert_eq!(drag.moved(Vec2::new(5.0, 5.0)), None);

        drag.press(Vec2::new(10.0, 10.0));
        assert!(drag.is_dragging());
        assert_eq!(drag.moved(Vec2::new(13.0, 8.0)), Some(Vec2::new(3.0, -2.0)));
        assert_eq!(drag.moved(Vec2::new(14.0, 8.0)), Some(Vec2::new(1.0, 0.0)));

        drag.release();
        assert_eq!(drag.moved(Vec2::new(20.0, 20.0)), None);
    }

    #[test]
    fn test_boxed_demo_forwards() {
        let mut demo: Box<dyn Demo> = Box::new(Triangle::new(TriangleConfig::default()));
        assert_eq!(demo.name(), "triangle");
        assert!(demo.trigger("stop"));
        assert!(!demo.is_rendering());
        assert!(demo.select("QUADS").is_err());
        assert!(demo.select("LINE_LOOP").is_ok());
    }
}
