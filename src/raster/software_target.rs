//! CPU frame target with color, depth and 8-bit stencil buffers.

use crate::camera::PerspectiveCamera;
use crate::geometry::{Geometry, Vertex};
use crate::light::ShadowView;
use crate::material::Side;
use crate::postprocessing::{ClearFlags, FrameTarget, ScreenEffect, StencilMode};
use crate::scene::{MeshDraw, Scene};
use crate::texture::Image;
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::borrow::Cow;

/// Smallest clip-space w accepted; triangles reaching closer are dropped.
const MIN_W: f32 = 1e-4;

/// Color scale of receivers in shadow.
const SHADOW_DIM: f32 = 0.5;

/// Flat-shaded software rasterizer.
///
/// Meshes are filled with their material color (times the color map, if
/// any) without lighting. Skinned meshes are posed on the CPU, and shadow
/// receivers are dimmed where the scene's shadow light is blocked. Depth
/// test is less-or-equal and stencil behaves like the GPU renderer, so
/// compositions can be inspected per pixel.
#[derive(Debug, Clone)]
pub struct SoftwareTarget {
    width: u32,
    height: u32,
    color: Vec<[f32; 4]>,
    depth: Vec<f32>,
    stencil: Vec<u8>,
}

impl SoftwareTarget {
    /// Create a target cleared to black, far depth and zero stencil.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            color: vec![[0.0, 0.0, 0.0, 1.0]; len],
            depth: vec![1.0; len],
            stencil: vec![0; len],
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color at a pixel (row 0 at the top).
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.color[self.index(x, y)]
    }

    /// Stencil value at a pixel.
    pub fn stencil_at(&self, x: u32, y: u32) -> u8 {
        self.stencil[self.index(x, y)]
    }

    /// Depth at a pixel.
    pub fn depth_at(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }

    /// Color buffer, row-major from the top.
    #[inline]
    pub fn color_buffer(&self) -> &[[f32; 4]] {
        &self.color
    }

    /// Color buffer quantized to RGBA8.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.color
            .iter()
            .flat_map(|c| c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        (y * self.width + x) as usize
    }

    fn stencil_passes(&self, index: usize, stencil: StencilMode) -> bool {
        match stencil {
            StencilMode::Test(v) => self.stencil[index] == v,
            _ => true,
        }
    }

    fn draw_mesh(&mut self, draw: &MeshDraw<'_>, view_proj: Mat4, stencil: StencilMode, shadow: Option<&ShadowDepth>) {
        let mvp = view_proj * draw.world;
        let material = draw.material;
        let surface = Surface {
            base: material.color.to_rgba(material.effective_opacity()),
            map: material.map.as_deref(),
            transparent: material.transparent,
            shadow: shadow.filter(|_| draw.receive_shadow),
        };
        let vertices = posed_vertices(draw);

        for tri in draw.geometry.indices.chunks_exact(3) {
            let Some(verts) = tri.iter().map(|&i| vertices.get(i as usize)).collect::<Option<Vec<_>>>() else {
                continue;
            };
            let clip: Vec<Vec4> = verts
                .iter()
                .map(|v| mvp * Vec3::from(v.position).extend(1.0))
                .collect();
            if clip.iter().any(|c| c.w < MIN_W) {
                continue;
            }
            let ndc: Vec<Vec3> = clip.iter().map(|c| c.truncate() / c.w).collect();

            let area = (ndc[1].truncate() - ndc[0].truncate()).perp_dot(ndc[2].truncate() - ndc[0].truncate());
            let culled = match material.side {
                Side::Front => area <= 0.0,
                Side::Back => area >= 0.0,
                Side::Double => area == 0.0,
            };
            if culled {
                continue;
            }

            let screen: Vec<Vec2> = ndc
                .iter()
                .map(|p| {
                    Vec2::new(
                        (p.x + 1.0) * 0.5 * self.width as f32,
                        (1.0 - p.y) * 0.5 * self.height as f32,
                    )
                })
                .collect();
            let uvs: Vec<Vec2> = verts.iter().map(|v| Vec2::from(v.uv)).collect();
            let world: Vec<Vec3> = verts
                .iter()
                .map(|v| draw.world.transform_point3(Vec3::from(v.position)))
                .collect();

            self.fill_triangle(&screen, &ndc, &uvs, &world, &surface, stencil);
        }
    }

    fn fill_triangle(
        &mut self,
        screen: &[Vec2],
        ndc: &[Vec3],
        uvs: &[Vec2],
        world: &[Vec3],
        surface: &Surface<'_>,
        stencil: StencilMode,
    ) {
        let (width, height) = (self.width, self.height);
        cover(screen, width, height, |x, y, [w0, w1, w2]| {
            let index = (y * width + x) as usize;
            if !self.stencil_passes(index, stencil) {
                return;
            }
            if let StencilMode::Write(v) = stencil {
                self.stencil[index] = v;
                return;
            }

            let z = w0 * ndc[0].z + w1 * ndc[1].z + w2 * ndc[2].z;
            if !(0.0..=1.0).contains(&z) || z > self.depth[index] {
                return;
            }

            let mut rgba = surface.base;
            if let Some(image) = surface.map {
                let uv = uvs[0] * w0 + uvs[1] * w1 + uvs[2] * w2;
                let tx = (uv.x.clamp(0.0, 1.0) * image.width as f32) as u32;
                let ty = ((1.0 - uv.y.clamp(0.0, 1.0)) * image.height as f32) as u32;
                let texel = image.pixel(tx, ty);
                for k in 0..4 {
                    rgba[k] *= texel[k];
                }
            }
            if let Some(shadow) = surface.shadow {
                if shadow.occludes(world[0] * w0 + world[1] * w1 + world[2] * w2) {
                    for v in rgba.iter_mut().take(3) {
                        *v *= SHADOW_DIM;
                    }
                }
            }

            let dst = &mut self.color[index];
            if surface.transparent {
                let alpha = rgba[3];
                for k in 0..3 {
                    dst[k] = rgba[k] * alpha + dst[k] * (1.0 - alpha);
                }
            } else {
                *dst = [rgba[0], rgba[1], rgba[2], 1.0];
                self.depth[index] = z;
            }
        });
    }
}

/// Fill parameters shared by the triangles of one mesh.
struct Surface<'a> {
    base: [f32; 4],
    map: Option<&'a Image>,
    transparent: bool,
    shadow: Option<&'a ShadowDepth>,
}

/// Vertices after skinning, or the bind pose for rigid meshes.
fn posed_vertices<'a>(draw: &MeshDraw<'a>) -> Cow<'a, [Vertex]> {
    let geometry: &'a Geometry = draw.geometry;
    match &draw.joints {
        Some(joints) if geometry.is_skinned() => Cow::Owned(geometry.skinned_vertices(joints)),
        _ => Cow::Borrowed(geometry.vertices.as_slice()),
    }
}

/// Call `pixel(x, y, barycentrics)` for every pixel center inside the
/// screen-space triangle, clipped to `width` by `height`.
fn cover(screen: &[Vec2], width: u32, height: u32, mut pixel: impl FnMut(u32, u32, [f32; 3])) {
    let (a, b, c) = (screen[0], screen[1], screen[2]);
    let area = (b - a).perp_dot(c - a);
    if area.abs() < f32::EPSILON {
        return;
    }

    let min = a.min(b).min(c).max(Vec2::ZERO);
    let max = a.max(b).max(c).min(Vec2::new(width as f32, height as f32));
    if min.x >= max.x || min.y >= max.y {
        return;
    }

    for y in (min.y.floor() as u32)..(max.y.ceil() as u32).min(height) {
        for x in (min.x.floor() as u32)..(max.x.ceil() as u32).min(width) {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = (c - b).perp_dot(p - b) / area;
            let w1 = (a - c).perp_dot(p - c) / area;
            let w2 = 1.0 - w0 - w1;
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                pixel(x, y, [w0, w1, w2]);
            }
        }
    }
}

/// Nearest caster depth per texel, seen from the shadow light.
#[derive(Debug, Clone)]
struct ShadowDepth {
    view: ShadowView,
    size: u32,
    depth: Vec<f32>,
}

impl ShadowDepth {
    fn render(view: ShadowView, draws: &[MeshDraw<'_>]) -> Self {
        let size = view.shadow.map_size.max(1);
        let mut depth = vec![1.0; (size * size) as usize];
        let extent = size as f32;

        for draw in draws.iter().filter(|d| d.cast_shadow) {
            let to_light = view.view_proj * draw.world;
            let vertices = posed_vertices(draw);
            let projected: Vec<Vec3> = vertices
                .iter()
                .map(|v| to_light.project_point3(Vec3::from(v.position)))
                .collect();

            for tri in draw.geometry.indices.chunks_exact(3) {
                let Some(ndc) = tri.iter().map(|&i| projected.get(i as usize).copied()).collect::<Option<Vec<_>>>()
                else {
                    continue;
                };
                let texels: Vec<Vec2> = ndc
                    .iter()
                    .map(|p| Vec2::new((p.x + 1.0) * 0.5 * extent, (1.0 - p.y) * 0.5 * extent))
                    .collect();
                cover(&texels, size, size, |x, y, [w0, w1, w2]| {
                    let z = w0 * ndc[0].z + w1 * ndc[1].z + w2 * ndc[2].z;
                    let index = (y * size + x) as usize;
                    if (0.0..=1.0).contains(&z) && z < depth[index] {
                        depth[index] = z;
                    }
                });
            }
        }
        Self { view, size, depth }
    }

    /// Whether a caster lies between the light and `world`.
    fn occludes(&self, world: Vec3) -> bool {
        let Some((uv, depth)) = self.view.project(world) else {
            return false;
        };
        let last = self.size - 1;
        let x = ((uv.x * self.size as f32) as u32).min(last);
        let y = ((uv.y * self.size as f32) as u32).min(last);
        depth - self.view.shadow.depth_bias() > self.depth[(y * self.size + x) as usize]
    }
}

impl FrameTarget for SoftwareTarget {
    fn clear(&mut self, flags: ClearFlags) {
        if let Some(color) = flags.color {
            self.color.fill(color.to_rgba(1.0));
        }
        if flags.depth {
            self.depth.fill(1.0);
        }
        if let Some(value) = flags.stencil {
            self.stencil.fill(value);
        }
    }

    fn draw_scene(&mut self, scene: &Scene, camera: &PerspectiveCamera, stencil: StencilMode) {
        let view_proj = camera.view_projection_matrix();
        let draws = scene.render_list(camera.position);
        let shadow = scene
            .shadow_view()
            .filter(|_| draws.iter().any(|d| d.cast_shadow))
            .map(|view| ShadowDepth::render(view, &draws));
        for draw in &draws {
            self.draw_mesh(draw, view_proj, stencil, shadow.as_ref());
        }
    }

    fn apply_effect(&mut self, effect: ScreenEffect, stencil: StencilMode) {
        for index in 0..self.color.len() {
            if !self.stencil_passes(index, stencil) {
                continue;
            }
            let c = &mut self.color[index];
            for v in c.iter_mut().take(3) {
                *v = effect.apply(*v);
            }
        }
    }
}
