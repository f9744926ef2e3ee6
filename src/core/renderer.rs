//! GPU scene renderer.
//!
//! Scenes are drawn into an offscreen color target that shares one
//! depth-stencil buffer across the passes of a frame. Two color targets
//! ping-pong for screen effects; [`GpuFrame::present`] blits the current one
//! to the surface.
//!
//! When the scene has a shadow light, casters are first drawn into a shadow
//! map from that light. Skinned meshes use a second vertex buffer of joint
//! influences and a per-object joint matrix uniform.

use super::{Context, Id, RenderConfig, ShadowMap, ShadowPass};
use crate::camera::PerspectiveCamera;
use crate::geometry::{GeometryBuffers, SkinVertex, Vertex};
use crate::light::{LightsUniform, ShadowView};
use crate::material::{MaterialUniform, Side};
use crate::postprocessing::{ClearFlags, FrameTarget, ScreenEffect, ScreenPass, ScreenStencil, StencilMode};
use crate::scene::{Fog, MeshDraw, ObjectId, Scene};
use crate::texture::{SamplerDescriptor, Texture2D};
use glam::{Mat3, Mat4};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

/// Format of the offscreen color targets.
const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Joints a skinned mesh can use on the GPU.
pub const MAX_JOINTS: usize = 64;

/// Shadow map side used until a scene asks for another.
const DEFAULT_SHADOW_MAP_SIZE: u32 = 512;

type JointMatrix = [[f32; 4]; 4];

/// Render statistics for the current frame.
#[derive(Debug, Clone, Default)]
pub struct RenderInfo {
    /// Number of draw calls.
    pub draw_calls: u32,
    /// Number of triangles rendered.
    pub triangles: u32,
    /// Number of render passes recorded.
    pub passes: u32,
    /// Frame number.
    pub frame: u64,
}

impl RenderInfo {
    /// Reset the per-frame statistics.
    pub fn reset(&mut self) {
        self.draw_calls = 0;
        self.triangles = 0;
        self.passes = 0;
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    fog_color: [f32; 4],
    fog_range: [f32; 4],
    shadow_view_proj: [[f32; 4]; 4],
    shadow_params: [f32; 4],
}

impl SceneUniform {
    fn new(scene: &Scene, camera: &PerspectiveCamera, shadow: Option<&ShadowView>) -> Self {
        let (fog_color, fog_range) = match scene.fog {
            Fog::None => ([0.0; 4], [0.0; 4]),
            Fog::Linear { color, near, far } => (color.to_rgba(1.0), [near, far, 0.0, 0.0]),
        };
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).to_array(),
            fog_color,
            fog_range,
            shadow_view_proj: shadow.map_or(Mat4::IDENTITY, |s| s.view_proj).to_cols_array_2d(),
            shadow_params: shadow.map_or([0.0; 4], |s| {
                [
                    1.0,
                    s.shadow.depth_bias(),
                    s.light_index as f32,
                    s.shadow.map_size as f32,
                ]
            }),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ObjectUniform {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    material: MaterialUniform,
    // receive_shadow, unused x3
    flags: [u32; 4],
}

impl ObjectUniform {
    fn new(draw: &MeshDraw<'_>) -> Self {
        let linear = Mat3::from_mat4(draw.world);
        let normal = if linear.determinant().abs() > f32::EPSILON {
            Mat4::from_mat3(linear.inverse().transpose())
        } else {
            Mat4::IDENTITY
        };
        Self {
            model: draw.world.to_cols_array_2d(),
            normal_matrix: normal.to_cols_array_2d(),
            material: MaterialUniform::from(draw.material),
            flags: [draw.receive_shadow as u32, 0, 0, 0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    stencil: u8,
    transparent: bool,
    side: Side,
    skinned: bool,
}

impl PipelineKey {
    fn new(draw: &MeshDraw<'_>, stencil: StencilMode) -> Self {
        Self {
            stencil: match stencil {
                StencilMode::Off => 0,
                StencilMode::Write(_) => 1,
                StencilMode::Test(_) => 2,
            },
            transparent: draw.material.transparent,
            side: draw.material.side,
            skinned: draw.is_skinned(),
        }
    }
}

struct SceneBinding {
    uniform: wgpu::Buffer,
    lights: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    shadow_camera: wgpu::Buffer,
    shadow_bind_group: wgpu::BindGroup,
}

struct ObjectBinding {
    uniform: wgpu::Buffer,
    joints: Option<wgpu::Buffer>,
    bind_group: wgpu::BindGroup,
    map: Option<Id>,
}

/// Joint matrices padded to the uniform array length.
fn joint_uniform(joints: &[Mat4]) -> Vec<JointMatrix> {
    let mut matrices = vec![Mat4::IDENTITY.to_cols_array_2d(); MAX_JOINTS];
    for (slot, joint) in matrices.iter_mut().zip(joints) {
        *slot = joint.to_cols_array_2d();
    }
    matrices
}

struct Targets {
    colors: [wgpu::Texture; 2],
    views: [wgpu::TextureView; 2],
    depth_view: wgpu::TextureView,
    current: usize,
}

impl Targets {
    fn new(ctx: &Context) -> Self {
        let color = |label| {
            ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: ctx.width,
                    height: ctx.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: OFFSCREEN_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            })
        };
        let colors = [color("Offscreen Color A"), color("Offscreen Color B")];
        let views = [
            colors[0].create_view(&wgpu::TextureViewDescriptor::default()),
            colors[1].create_view(&wgpu::TextureViewDescriptor::default()),
        ];
        let depth_view = ctx
            .create_depth_texture()
            .create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            colors,
            views,
            depth_view,
            current: 0,
        }
    }
}

/// Draws scenes for the effect composer.
pub struct SceneRenderer {
    config: RenderConfig,
    info: RenderInfo,
    shader: wgpu::ShaderModule,
    scene_layout: wgpu::BindGroupLayout,
    object_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    screen: ScreenPass,
    targets: Targets,
    depth_format: wgpu::TextureFormat,
    sampler: wgpu::Sampler,
    white: Texture2D,
    textures: HashMap<Id, Texture2D>,
    geometries: HashMap<Id, GeometryBuffers>,
    scenes: HashMap<Id, SceneBinding>,
    objects: HashMap<(Id, ObjectId), ObjectBinding>,
    shadow_map: ShadowMap,
    shadow_pass: ShadowPass,
    rest_joints: wgpu::Buffer,
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl SceneRenderer {
    /// Create a new renderer.
    pub fn new(ctx: &Context, config: RenderConfig) -> Self {
        let device = &ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
        });

        let vertex_fragment = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[
                uniform_entry(0, vertex_fragment),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Bind Group Layout"),
            entries: &[
                uniform_entry(0, vertex_fragment),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                uniform_entry(3, wgpu::ShaderStages::VERTEX),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&scene_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let shadow_pass = ShadowPass::new(device, &object_layout);
        let rest_joints = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Rest Joint Buffer"),
            contents: bytemuck::cast_slice(&joint_uniform(&[])),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        Self {
            config,
            info: RenderInfo::default(),
            shader,
            scene_layout,
            object_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            screen: ScreenPass::new(device),
            targets: Targets::new(ctx),
            depth_format: ctx.depth_format,
            sampler: SamplerDescriptor::linear().create(device, Some("Scene Sampler")),
            white: Texture2D::white(device, &ctx.queue),
            textures: HashMap::new(),
            geometries: HashMap::new(),
            scenes: HashMap::new(),
            objects: HashMap::new(),
            shadow_map: ShadowMap::new(device, DEFAULT_SHADOW_MAP_SIZE),
            shadow_pass,
            rest_joints,
        }
    }

    /// Get render info.
    #[inline]
    pub fn info(&self) -> &RenderInfo {
        &self.info
    }

    /// Renderer configuration.
    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Recreate the offscreen targets after the context was resized.
    pub fn resize(&mut self, ctx: &Context) {
        self.targets = Targets::new(ctx);
    }

    /// Acquire the surface and start recording a frame.
    pub fn begin_frame<'a>(&'a mut self, ctx: &'a Context) -> Result<GpuFrame<'a>, wgpu::SurfaceError> {
        let surface = ctx.get_current_texture()?;
        let view = surface.texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.info.reset();
        self.info.frame += 1;
        self.targets.current = 0;
        Ok(GpuFrame {
            encoder: ctx.create_command_encoder(),
            renderer: self,
            ctx,
            surface,
            view,
        })
    }

    fn has_stencil(&self) -> bool {
        self.depth_format.has_stencil_aspect()
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, key: PipelineKey) {
        let stencil_face = match key.stencil {
            1 => Some(wgpu::StencilFaceState {
                compare: wgpu::CompareFunction::Always,
                fail_op: wgpu::StencilOperation::Replace,
                depth_fail_op: wgpu::StencilOperation::Replace,
                pass_op: wgpu::StencilOperation::Replace,
            }),
            2 => Some(wgpu::StencilFaceState {
                compare: wgpu::CompareFunction::Equal,
                fail_op: wgpu::StencilOperation::Keep,
                depth_fail_op: wgpu::StencilOperation::Keep,
                pass_op: wgpu::StencilOperation::Keep,
            }),
            _ => None,
        };
        let stencil = match stencil_face.filter(|_| self.has_stencil()) {
            Some(face) => wgpu::StencilState {
                front: face,
                back: face,
                read_mask: 0xff,
                write_mask: if key.stencil == 1 { 0xff } else { 0 },
            },
            None => wgpu::StencilState::default(),
        };
        let mask_only = key.stencil == 1;
        let depth_format = self.depth_format;
        let Self { shader, pipeline_layout, pipelines, .. } = self;

        pipelines.entry(key).or_insert_with(|| {
            log::debug!("creating scene pipeline {:?}", key);
            let buffers = [Vertex::layout(), SkinVertex::layout()];
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Scene Pipeline"),
                layout: Some(pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some(if key.skinned { "vs_skinned" } else { "vs_main" }),
                    buffers: if key.skinned { &buffers[..] } else { &buffers[..1] },
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: OFFSCREEN_FORMAT,
                        blend: key.transparent.then_some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: if mask_only {
                            wgpu::ColorWrites::empty()
                        } else {
                            wgpu::ColorWrites::ALL
                        },
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: key.side.cull_mode(),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: depth_format,
                    depth_write_enabled: !key.transparent && !mask_only,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil,
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        });
    }

    fn prepare_scene(&mut self, ctx: &Context, scene: &Scene, camera: &PerspectiveCamera, shadow: Option<&ShadowView>) {
        let device = &ctx.device;
        if let Some(shadow) = shadow {
            if self.shadow_map.resize(device, shadow.shadow.map_size) {
                // Scene bind groups reference the old texture.
                self.scenes.clear();
            }
        }

        let Self {
            scene_layout,
            shadow_map,
            shadow_pass,
            scenes,
            ..
        } = self;
        let binding = scenes.entry(scene.id()).or_insert_with(|| {
            let uniform_buffer = |label, size| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(label),
                    size,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            };
            let uniform = uniform_buffer("Scene Uniform Buffer", std::mem::size_of::<SceneUniform>() as u64);
            let lights = uniform_buffer("Lights Uniform Buffer", std::mem::size_of::<LightsUniform>() as u64);
            let shadow_camera = uniform_buffer("Shadow Light Camera Buffer", std::mem::size_of::<JointMatrix>() as u64);
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Scene Bind Group"),
                layout: scene_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: lights.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(shadow_map.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(shadow_pass.sampler()),
                    },
                ],
            });
            let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Shadow Light Camera Bind Group"),
                layout: shadow_pass.light_layout(),
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: shadow_camera.as_entire_binding(),
                }],
            });
            SceneBinding {
                uniform,
                lights,
                bind_group,
                shadow_camera,
                shadow_bind_group,
            }
        });

        ctx.queue.write_buffer(
            &binding.uniform,
            0,
            bytemuck::cast_slice(&[SceneUniform::new(scene, camera, shadow)]),
        );
        ctx.queue.write_buffer(
            &binding.lights,
            0,
            bytemuck::cast_slice(&[LightsUniform::from_lights(scene.lights())]),
        );
        if let Some(shadow) = shadow {
            ctx.queue.write_buffer(
                &binding.shadow_camera,
                0,
                bytemuck::cast_slice(&[shadow.view_proj.to_cols_array_2d()]),
            );
        }
    }

    fn prepare_object(&mut self, ctx: &Context, scene: Id, draw: &MeshDraw<'_>) {
        let device = &ctx.device;
        let geometry = draw.geometry;
        self.geometries
            .entry(geometry.id())
            .or_insert_with(|| geometry.upload(device));

        let map = draw.material.map.as_ref();
        if let Some(image) = map {
            self.textures
                .entry(image.id())
                .or_insert_with(|| Texture2D::from_image(device, &ctx.queue, image));
        }
        let map_id = map.map(|image| image.id());

        let key = (scene, draw.object);
        let skinned = draw.is_skinned();
        let stale = self
            .objects
            .get(&key)
            .map_or(true, |o| o.map != map_id || o.joints.is_some() != skinned);
        if stale {
            let existing = self.objects.remove(&key);
            let (uniform, joints) = match existing {
                Some(existing) => (existing.uniform, existing.joints),
                None => (
                    device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("Object Uniform Buffer"),
                        size: std::mem::size_of::<ObjectUniform>() as u64,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    }),
                    None,
                ),
            };
            let joints = match (skinned, joints) {
                (true, Some(joints)) => Some(joints),
                (true, None) => {
                    if let Some(count) = draw.joints.as_ref().map(Vec::len).filter(|&n| n > MAX_JOINTS) {
                        log::warn!("{} joints exceed the limit of {}, extra joints are ignored", count, MAX_JOINTS);
                    }
                    Some(device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("Joint Uniform Buffer"),
                        size: (MAX_JOINTS * std::mem::size_of::<JointMatrix>()) as u64,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    }))
                }
                (false, _) => None,
            };
            let texture = map_id
                .and_then(|id| self.textures.get(&id))
                .unwrap_or(&self.white);
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Object Bind Group"),
                layout: &self.object_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(texture.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: joints.as_ref().unwrap_or(&self.rest_joints).as_entire_binding(),
                    },
                ],
            });
            self.objects.insert(
                key,
                ObjectBinding {
                    uniform,
                    joints,
                    bind_group,
                    map: map_id,
                },
            );
        }

        if let Some(binding) = self.objects.get(&key) {
            ctx.queue
                .write_buffer(&binding.uniform, 0, bytemuck::cast_slice(&[ObjectUniform::new(draw)]));
            if let (Some(buffer), Some(joints)) = (&binding.joints, &draw.joints) {
                ctx.queue.write_buffer(buffer, 0, bytemuck::cast_slice(&joint_uniform(joints)));
            }
        }
    }
}

/// A frame being recorded. Implements [`FrameTarget`] for the composer.
pub struct GpuFrame<'a> {
    renderer: &'a mut SceneRenderer,
    ctx: &'a Context,
    encoder: wgpu::CommandEncoder,
    surface: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

fn depth_stencil_attachment(
    view: &wgpu::TextureView,
    has_stencil: bool,
    depth: wgpu::LoadOp<f32>,
    stencil: wgpu::LoadOp<u32>,
) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load: depth,
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: has_stencil.then_some(wgpu::Operations {
            load: stencil,
            store: wgpu::StoreOp::Store,
        }),
    }
}

impl GpuFrame<'_> {
    /// Fill the shadow map with the scene's casters seen from its shadow light.
    fn draw_shadow_casters(&mut self, scene: &Scene, draws: &[MeshDraw<'_>]) {
        let renderer = &*self.renderer;
        let Some(binding) = renderer.scenes.get(&scene.id()) else {
            return;
        };
        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: renderer.shadow_map.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_bind_group(0, &binding.shadow_bind_group, &[]);

        let mut draw_calls = 0;
        for draw in draws.iter().filter(|d| d.cast_shadow) {
            let skinned = draw.is_skinned();
            let (Some(pipeline), Some(object), Some(buffers)) = (
                renderer.shadow_pass.pipeline(skinned),
                renderer.objects.get(&(scene.id(), draw.object)),
                renderer.geometries.get(&draw.geometry.id()),
            ) else {
                continue;
            };
            pass.set_pipeline(pipeline);
            pass.set_bind_group(1, &object.bind_group, &[]);
            pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
            if let (true, Some(skin)) = (skinned, &buffers.skin_buffer) {
                pass.set_vertex_buffer(1, skin.slice(..));
            }
            pass.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..buffers.index_count, 0, 0..1);
            draw_calls += 1;
        }
        drop(pass);

        let info = &mut self.renderer.info;
        info.draw_calls += draw_calls;
        info.passes += 1;
    }

    /// Blit the composed image to the surface and present it.
    pub fn present(mut self) {
        let renderer = &mut *self.renderer;
        let current = renderer.targets.current;
        renderer.screen.draw(
            &self.ctx.device,
            &self.ctx.queue,
            &mut self.encoder,
            ScreenEffect::Copy,
            &renderer.targets.views[current],
            &self.view,
            self.ctx.surface_format,
            None,
        );
        renderer.info.passes += 1;
        self.ctx.submit(std::iter::once(self.encoder.finish()));
        self.surface.present();
    }
}

impl FrameTarget for GpuFrame<'_> {
    fn clear(&mut self, flags: ClearFlags) {
        let color = match flags.color {
            Some(c) => wgpu::LoadOp::Clear(c.to_wgpu(1.0)),
            None => wgpu::LoadOp::Load,
        };
        let depth = if flags.depth { wgpu::LoadOp::Clear(1.0) } else { wgpu::LoadOp::Load };
        let stencil = match flags.stencil {
            Some(v) => wgpu::LoadOp::Clear(v as u32),
            None => wgpu::LoadOp::Load,
        };

        let renderer = &*self.renderer;
        let depth_stencil =
            depth_stencil_attachment(&renderer.targets.depth_view, renderer.has_stencil(), depth, stencil);
        let target = &renderer.targets.views[renderer.targets.current];
        let pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(depth_stencil),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        drop(pass);
        self.renderer.info.passes += 1;
    }

    fn draw_scene(&mut self, scene: &Scene, camera: &PerspectiveCamera, stencil: StencilMode) {
        let draws = scene.render_list(camera.position);
        let shadow = scene.shadow_view().filter(|_| draws.iter().any(|d| d.cast_shadow));
        {
            let renderer = &mut *self.renderer;
            renderer.prepare_scene(self.ctx, scene, camera, shadow.as_ref());
            for draw in &draws {
                renderer.prepare_object(self.ctx, scene.id(), draw);
                renderer.ensure_pipeline(&self.ctx.device, PipelineKey::new(draw, stencil));
                if shadow.is_some() && draw.cast_shadow {
                    renderer.shadow_pass.ensure_pipeline(&self.ctx.device, draw.is_skinned());
                }
            }
        }
        if shadow.is_some() {
            self.draw_shadow_casters(scene, &draws);
        }

        let renderer = &*self.renderer;
        let depth_stencil = depth_stencil_attachment(
            &renderer.targets.depth_view,
            renderer.has_stencil(),
            wgpu::LoadOp::Load,
            wgpu::LoadOp::Load,
        );
        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &renderer.targets.views[renderer.targets.current],
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(depth_stencil),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let Some(scene_binding) = renderer.scenes.get(&scene.id()) else {
            return;
        };
        pass.set_bind_group(0, &scene_binding.bind_group, &[]);
        if let StencilMode::Write(v) | StencilMode::Test(v) = stencil {
            if renderer.has_stencil() {
                pass.set_stencil_reference(v as u32);
            }
        }

        let mut draw_calls = 0;
        let mut triangles = 0;
        for draw in &draws {
            let (Some(pipeline), Some(object), Some(buffers)) = (
                renderer.pipelines.get(&PipelineKey::new(draw, stencil)),
                renderer.objects.get(&(scene.id(), draw.object)),
                renderer.geometries.get(&draw.geometry.id()),
            ) else {
                continue;
            };
            pass.set_pipeline(pipeline);
            pass.set_bind_group(1, &object.bind_group, &[]);
            pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
            if let (true, Some(skin)) = (draw.is_skinned(), &buffers.skin_buffer) {
                pass.set_vertex_buffer(1, skin.slice(..));
            }
            pass.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..buffers.index_count, 0, 0..1);
            draw_calls += 1;
            triangles += buffers.index_count / 3;
        }
        drop(pass);

        let info = &mut self.renderer.info;
        info.draw_calls += draw_calls;
        info.triangles += triangles;
        info.passes += 1;
    }

    fn apply_effect(&mut self, effect: ScreenEffect, stencil: StencilMode) {
        let renderer = &mut *self.renderer;
        let read = renderer.targets.current;
        let write = 1 - read;
        let reference = match stencil {
            StencilMode::Test(v) if renderer.has_stencil() => Some(v),
            _ => None,
        };

        if reference.is_some() {
            // Pixels outside the mask keep the unprocessed color.
            self.encoder.copy_texture_to_texture(
                renderer.targets.colors[read].as_image_copy(),
                renderer.targets.colors[write].as_image_copy(),
                renderer.targets.colors[read].size(),
            );
        }

        let Targets { views, depth_view, .. } = &renderer.targets;
        renderer.screen.draw(
            &self.ctx.device,
            &self.ctx.queue,
            &mut self.encoder,
            effect,
            &views[read],
            &views[write],
            OFFSCREEN_FORMAT,
            reference.map(|reference| ScreenStencil {
                view: depth_view,
                format: renderer.depth_format,
                reference,
            }),
        );
        renderer.targets.current = write;
        renderer.info.passes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::{DirectionalLight, DirectionalShadow};
    use crate::math::Color;
    use glam::Vec3;

    #[test]
    fn test_uniform_layouts_match_shader() {
        assert_eq!(std::mem::size_of::<SceneUniform>(), 192);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 176);
        assert_eq!(std::mem::size_of::<JointMatrix>() * MAX_JOINTS, 4096);
    }

    #[test]
    fn test_joint_uniform_pads_with_identity() {
        let moved = Mat4::from_translation(Vec3::X);
        let matrices = joint_uniform(&[moved]);
        assert_eq!(matrices.len(), MAX_JOINTS);
        assert_eq!(matrices[0], moved.to_cols_array_2d());
        assert_eq!(matrices[MAX_JOINTS - 1], Mat4::IDENTITY.to_cols_array_2d());

        let many = vec![moved; MAX_JOINTS + 8];
        assert_eq!(joint_uniform(&many).len(), MAX_JOINTS);
    }

    #[test]
    fn test_scene_uniform_carries_shadow_light() {
        let mut scene = Scene::new();
        scene.add_light(
            DirectionalLight::new(Color::WHITE, 1.0, Vec3::new(0.0, 12.0, 10.0)).with_shadow(DirectionalShadow::new(15.0)),
        );
        let camera = PerspectiveCamera::new(60.0, 1.0, 0.1, 100.0);

        let unshadowed = SceneUniform::new(&scene, &camera, None);
        assert_eq!(unshadowed.shadow_params, [0.0; 4]);

        let view = scene.shadow_view().unwrap();
        let shadowed = SceneUniform::new(&scene, &camera, Some(&view));
        assert_eq!(shadowed.shadow_params[0], 1.0);
        assert_eq!(shadowed.shadow_params[2], 0.0);
        assert_eq!(shadowed.shadow_params[3], 512.0);
        assert_eq!(shadowed.shadow_view_proj, view.view_proj.to_cols_array_2d());
    }
}
