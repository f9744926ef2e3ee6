//! Shadow map texture and the depth-only pass that fills it.

use crate::geometry::{SkinVertex, Vertex};
use std::collections::HashMap;

/// Format of the shadow depth texture.
pub const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth texture rendered from the shadow light.
pub struct ShadowMap {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: u32,
}

impl ShadowMap {
    /// Create a square shadow map.
    pub fn new(device: &wgpu::Device, size: u32) -> Self {
        let size = size.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view, size }
    }

    /// View for rendering and sampling.
    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Side in texels.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Recreate the texture at a new size. Returns whether it changed.
    pub fn resize(&mut self, device: &wgpu::Device, size: u32) -> bool {
        if self.size == size.max(1) {
            return false;
        }
        log::debug!("shadow map {} -> {}", self.texture.width(), size);
        *self = Self::new(device, size);
        true
    }
}

/// Depth-only pipelines drawing shadow casters from the light.
pub struct ShadowPass {
    shader: wgpu::ShaderModule,
    light_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<bool, wgpu::RenderPipeline>,
    sampler: wgpu::Sampler,
}

impl ShadowPass {
    /// Create the pass; `object_layout` is the scene renderer's per-object layout.
    pub fn new(device: &wgpu::Device, object_layout: &wgpu::BindGroupLayout) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shadow.wgsl").into()),
        });

        let light_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Light Camera Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&light_layout, object_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            shader,
            light_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            sampler,
        }
    }

    /// Layout of the light camera bind group (group 0).
    #[inline]
    pub fn light_layout(&self) -> &wgpu::BindGroupLayout {
        &self.light_layout
    }

    /// Comparison sampler for reading the shadow map.
    #[inline]
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Create the pipeline for rigid or skinned casters.
    pub fn ensure_pipeline(&mut self, device: &wgpu::Device, skinned: bool) {
        let Self { shader, pipeline_layout, pipelines, .. } = self;
        pipelines.entry(skinned).or_insert_with(|| {
            log::debug!("creating shadow pipeline (skinned: {})", skinned);
            let buffers = [Vertex::layout(), SkinVertex::layout()];
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Shadow Pipeline"),
                layout: Some(pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some(if skinned { "vs_skinned" } else { "vs_main" }),
                    buffers: if skinned { &buffers[..] } else { &buffers[..1] },
                    compilation_options: Default::default(),
                },
                fragment: None,
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: SHADOW_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState {
                        constant: 2,
                        slope_scale: 2.0,
                        clamp: 0.0,
                    },
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        });
    }

    /// Pipeline for rigid or skinned casters, once created.
    #[inline]
    pub fn pipeline(&self, skinned: bool) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&skinned)
    }
}
