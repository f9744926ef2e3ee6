//! Shader program compilation.

use std::fmt;
use thiserror::Error;

/// Pipeline stage a shader module belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// A shader module failed validation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{stage} shader failed to compile: {message}")]
pub struct ShaderError {
    /// Stage of the failing module.
    pub stage: ShaderStage,
    /// Compiler output.
    pub message: String,
}

/// A linked vertex + fragment pair.
///
/// Both stages are WGSL with entry points `vs_main` and `fs_main`.
pub struct ShaderProgram {
    label: String,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
}

impl ShaderProgram {
    /// Vertex entry point name.
    pub const VERTEX_ENTRY: &'static str = "vs_main";
    /// Fragment entry point name.
    pub const FRAGMENT_ENTRY: &'static str = "fs_main";

    /// Compile both stages, reporting the first validation error.
    pub async fn compile(
        device: &wgpu::Device,
        label: &str,
        vertex: &str,
        fragment: &str,
    ) -> Result<Self, ShaderError> {
        let vertex = compile_stage(device, label, ShaderStage::Vertex, vertex).await?;
        let fragment = compile_stage(device, label, ShaderStage::Fragment, fragment).await?;
        log::debug!("compiled shader program {}", label);
        Ok(Self {
            label: label.to_owned(),
            vertex,
            fragment,
        })
    }

    /// Debug label.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Vertex stage module.
    #[inline]
    pub fn vertex(&self) -> &wgpu::ShaderModule {
        &self.vertex
    }

    /// Fragment stage module.
    #[inline]
    pub fn fragment(&self) -> &wgpu::ShaderModule {
        &self.fragment
    }
}

async fn compile_stage(
    device: &wgpu::Device,
    label: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<wgpu::ShaderModule, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match device.pop_error_scope().await {
        Some(error) => Err(ShaderError {
            stage,
            message: error.to_string(),
        }),
        None => Ok(module),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_names_stage() {
        let err = ShaderError {
            stage: ShaderStage::Fragment,
            message: "unknown identifier `colr`".into(),
        };
        assert_eq!(err.to_string(), "fragment shader failed to compile: unknown identifier `colr`");
    }
}
