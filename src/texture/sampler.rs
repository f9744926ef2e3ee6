//! Texture sampler configuration.

/// Texture addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMode {
    /// Clamp to edge pixel.
    #[default]
    ClampToEdge,
    /// Repeat the texture.
    Repeat,
}

impl From<AddressMode> for wgpu::AddressMode {
    fn from(mode: AddressMode) -> Self {
        match mode {
            AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            AddressMode::Repeat => wgpu::AddressMode::Repeat,
        }
    }
}

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Nearest neighbor (pixelated).
    Nearest,
    /// Linear interpolation (smooth).
    #[default]
    Linear,
}

impl From<FilterMode> for wgpu::FilterMode {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        }
    }
}

/// Sampler configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SamplerDescriptor {
    /// Address mode for U and V.
    pub address_mode: AddressMode,
    /// Magnification and minification filter.
    pub filter: FilterMode,
}

impl SamplerDescriptor {
    /// Linear filtering, clamped edges.
    pub fn linear() -> Self {
        Self::default()
    }

    /// Nearest filtering, clamped edges.
    pub fn nearest() -> Self {
        Self { filter: FilterMode::Nearest, ..Self::default() }
    }

    /// Create the wgpu sampler.
    pub fn create(&self, device: &wgpu::Device, label: Option<&str>) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label,
            address_mode_u: self.address_mode.into(),
            address_mode_v: self.address_mode.into(),
            address_mode_w: self.address_mode.into(),
            mag_filter: self.filter.into(),
            min_filter: self.filter.into(),
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        })
    }
}
