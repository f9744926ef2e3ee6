//! 2D texture implementation.

use super::Image;
use crate::core::Id;
use wgpu::util::DeviceExt;

/// A sampled 2D texture on the GPU.
pub struct Texture2D {
    /// Unique ID.
    id: Id,
    /// Texture width.
    width: u32,
    /// Texture height.
    height: u32,
    /// The GPU texture.
    texture: wgpu::Texture,
    /// Texture view.
    view: wgpu::TextureView,
}

impl Texture2D {
    /// Create a texture from RGBA8 data. Values are sampled as stored, with
    /// no sRGB decode.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        width: u32,
        height: u32,
        label: Option<&str>,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label,
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            id: Id::new(),
            width,
            height,
            texture,
            view,
        }
    }

    /// Upload a decoded image.
    pub fn from_image(device: &wgpu::Device, queue: &wgpu::Queue, image: &Image) -> Self {
        Self::from_rgba8(device, queue, &image.pixels, image.width, image.height, Some("Image Texture"))
    }

    /// Create a solid color texture (1x1).
    pub fn from_color(device: &wgpu::Device, queue: &wgpu::Queue, r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_rgba8(device, queue, &[r, g, b, a], 1, 1, Some("Solid Color Texture"))
    }

    /// Create a white texture (1x1).
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_color(device, queue, 255, 255, 255, 255)
    }

    /// Create a black texture (1x1).
    pub fn black(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_color(device, queue, 0, 0, 0, 255)
    }

    /// Get the unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Texture size in pixels.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Underlying GPU texture.
    #[inline]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Default view.
    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}
