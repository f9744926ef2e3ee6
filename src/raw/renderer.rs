//! Single-mesh renderer with fixed texture units and a small uniform block.

use super::{DrawMode, RawMesh, ShaderProgram};
use crate::core::Context;
use crate::math::Color;
use crate::texture::{SamplerDescriptor, Texture2D};
use glam::Mat4;
use std::collections::HashMap;

/// Number of texture units.
pub const TEXTURE_UNITS: usize = 2;

/// Uniform block shared by every raw shader.
///
/// WGSL layout:
/// ```text
/// struct Uniforms {
///     mvp: mat4x4<f32>,
///     normal_matrix: mat4x4<f32>,
///     time: f32,
///     progress: f32,
/// }
/// @group(0) @binding(0) var<uniform> u: Uniforms;
/// @group(0) @binding(1) var texture_unit0: texture_2d<f32>;
/// @group(0) @binding(2) var texture_unit1: texture_2d<f32>;
/// @group(0) @binding(3) var texture_sampler: sampler;
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RawUniforms {
    /// Model-view-projection matrix.
    pub mvp: [[f32; 4]; 4],
    /// Inverse transpose of the model matrix.
    pub normal_matrix: [[f32; 4]; 4],
    /// Seconds since rendering started.
    pub time: f32,
    /// Animation progress in `[0, 1]`.
    pub progress: f32,
    _pad: [f32; 2],
}

impl Default for RawUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, 0.0, 0.0)
    }
}

impl RawUniforms {
    /// Uniforms from a model and a view-projection matrix.
    pub fn new(model: Mat4, view_projection: Mat4, time: f32, progress: f32) -> Self {
        let normal = if model.determinant().abs() > f32::EPSILON {
            model.inverse().transpose()
        } else {
            Mat4::IDENTITY
        };
        Self {
            mvp: (view_projection * model).to_cols_array_2d(),
            normal_matrix: normal.to_cols_array_2d(),
            time,
            progress,
            _pad: [0.0; 2],
        }
    }

    /// Only the time uniform set.
    pub fn with_time(time: f32) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }
}

/// Fixed-function state that selects a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineState {
    /// Primitive topology.
    pub mode: DrawMode,
    /// Cull back faces.
    pub culling: bool,
    /// Depth test and write.
    pub depth_test: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            mode: DrawMode::Triangles,
            culling: false,
            depth_test: true,
        }
    }
}

/// Draws one [`RawMesh`] with a [`ShaderProgram`] straight to the surface.
pub struct RawRenderer {
    program: ShaderProgram,
    mesh: RawMesh,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineState, wgpu::RenderPipeline>,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    black: Texture2D,
    units: [Option<Texture2D>; TEXTURE_UNITS],
    textures_visible: bool,
    bind_group: Option<wgpu::BindGroup>,
    depth_view: wgpu::TextureView,
    state: PipelineState,
    clear_color: Color,
    square_viewport: bool,
}

impl RawRenderer {
    /// Create a renderer for a compiled program and an uploaded mesh.
    pub fn new(ctx: &Context, program: ShaderProgram, mesh: RawMesh, clear_color: Color) -> Self {
        let device = &ctx.device;

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Raw Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Raw Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Raw Uniform Buffer"),
            size: std::mem::size_of::<RawUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            program,
            mesh,
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            uniform_buffer,
            sampler: SamplerDescriptor::linear().create(device, Some("Raw Sampler")),
            black: Texture2D::black(device, &ctx.queue),
            units: [None, None],
            textures_visible: true,
            bind_group: None,
            depth_view: ctx
                .create_depth_texture()
                .create_view(&wgpu::TextureViewDescriptor::default()),
            state: PipelineState::default(),
            clear_color,
            square_viewport: false,
        }
    }

    /// Current fixed-function state.
    #[inline]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Select the primitive topology.
    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        self.state.mode = mode;
    }

    /// Enable or disable back-face culling.
    pub fn set_culling(&mut self, enabled: bool) {
        self.state.culling = enabled;
    }

    /// Enable or disable the depth test.
    pub fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
    }

    /// Restrict drawing to a centered square of side `min(width, height)`.
    pub fn set_square_viewport(&mut self, enabled: bool) {
        self.square_viewport = enabled;
    }

    /// Bind a texture to a unit. Out-of-range units are ignored.
    pub fn set_texture(&mut self, unit: usize, texture: Texture2D) {
        if let Some(slot) = self.units.get_mut(unit) {
            *slot = Some(texture);
            self.bind_group = None;
        } else {
            log::warn!("texture unit {} out of range", unit);
        }
    }

    /// Show or hide every bound texture. Hidden units sample black.
    pub fn set_texture_visibility(&mut self, visible: bool) {
        if self.textures_visible != visible {
            self.textures_visible = visible;
            self.bind_group = None;
        }
    }

    /// Whether textures are visible.
    #[inline]
    pub fn textures_visible(&self) -> bool {
        self.textures_visible
    }

    /// Recreate the depth buffer after the context was resized.
    pub fn resize(&mut self, ctx: &Context) {
        self.depth_view = ctx
            .create_depth_texture()
            .create_view(&wgpu::TextureViewDescriptor::default());
    }

    fn texture(&self, unit: usize) -> &Texture2D {
        match &self.units[unit] {
            Some(texture) if self.textures_visible => texture,
            _ => &self.black,
        }
    }

    fn ensure_bind_group(&mut self, device: &wgpu::Device) {
        if self.bind_group.is_some() {
            return;
        }
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Raw Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(self.texture(0).view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(self.texture(1).view()),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        self.bind_group = Some(bind_group);
    }

    fn ensure_pipeline(&mut self, ctx: &Context) {
        let state = self.state;
        self.mesh.prepare(&ctx.device, state.mode);
        let Self {
            program,
            mesh,
            pipeline_layout,
            pipelines,
            ..
        } = self;

        pipelines.entry(state).or_insert_with(|| {
            log::debug!("creating raw pipeline {:?}", state);
            let buffers = mesh.layouts();
            let strip_index_format = (state.mode.is_strip() && mesh.is_indexed(state.mode)).then_some(wgpu::IndexFormat::Uint16);
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(program.label()),
                layout: Some(pipeline_layout),
                vertex: wgpu::VertexState {
                    module: program.vertex(),
                    entry_point: Some(ShaderProgram::VERTEX_ENTRY),
                    buffers: &buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: program.fragment(),
                    entry_point: Some(ShaderProgram::FRAGMENT_ENTRY),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: state.mode.topology(),
                    strip_index_format,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: state.culling.then_some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: ctx.depth_format,
                    depth_write_enabled: state.depth_test,
                    depth_compare: if state.depth_test {
                        wgpu::CompareFunction::LessEqual
                    } else {
                        wgpu::CompareFunction::Always
                    },
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        });
    }

    /// Clear, upload uniforms, draw and present one frame.
    pub fn render(&mut self, ctx: &Context, uniforms: &RawUniforms) -> Result<(), wgpu::SurfaceError> {
        self.ensure_pipeline(ctx);
        self.ensure_bind_group(&ctx.device);
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(std::slice::from_ref(uniforms)));

        let surface = ctx.get_current_texture()?;
        let view = surface.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx.create_command_encoder();
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Raw Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color.to_wgpu(1.0)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if self.square_viewport {
                let (x, y, size) = square_viewport(ctx.width, ctx.height);
                pass.set_viewport(x, y, size, size, 0.0, 1.0);
            }

            if let (Some(pipeline), Some(bind_group)) = (self.pipelines.get(&self.state), &self.bind_group) {
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                self.mesh.draw(&mut pass, self.state.mode);
            }
        }
        ctx.submit(std::iter::once(encoder.finish()));
        surface.present();
        Ok(())
    }
}

/// Centered square viewport `(x, y, side)` inside a `width × height` target.
pub fn square_viewport(width: u32, height: u32) -> (f32, f32, f32) {
    let size = width.min(height) as f32;
    ((width as f32 - size) / 2.0, (height as f32 - size) / 2.0, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn test_uniform_block_size() {
        assert_eq!(std::mem::size_of::<RawUniforms>(), 144);
    }

    #[test]
    fn test_uniforms_compose_mvp() {
        let model = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let vp = Mat4::from_scale(Vec3::splat(2.0));
        let u = RawUniforms::new(model, vp, 1.5, 0.25);
        let mvp = Mat4::from_cols_array_2d(&u.mvp);
        assert_eq!(mvp * Vec4::new(0.0, 0.0, 0.0, 1.0), Vec4::new(2.0, 0.0, 0.0, 1.0));
        assert_eq!(Mat4::from_cols_array_2d(&u.normal_matrix), model.inverse().transpose());
        assert_eq!((u.time, u.progress), (1.5, 0.25));
    }

    #[test]
    fn test_square_viewport_is_centered() {
        assert_eq!(square_viewport(800, 600), (100.0, 0.0, 600.0));
        assert_eq!(square_viewport(300, 500), (0.0, 100.0, 300.0));
    }
}
