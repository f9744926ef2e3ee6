//! Crate-level error type.

use super::ContextError;
use crate::loaders::LoadError;
use crate::postprocessing::ComposerError;
use crate::raw::{DrawModeError, ShaderError};
use thiserror::Error;

/// Any error a demo can hit between launch and its first frame.
#[derive(Error, Debug)]
pub enum Error {
    /// No drawing context could be obtained for the canvas.
    #[error("drawing context unavailable: {0}")]
    ContextUnavailable(String),

    /// GPU context creation failed.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The demo's asset could not be fetched.
    #[error("failed to fetch {url}: {reason}")]
    AssetFetch {
        /// Requested URL.
        url: String,
        /// Why the fetch failed.
        reason: String,
    },

    /// An asset was fetched but could not be decoded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A shader failed to compile.
    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// The pass list is malformed.
    #[error(transparent)]
    Composer(#[from] ComposerError),

    /// Unknown draw mode name.
    #[error(transparent)]
    DrawMode(#[from] DrawModeError),

    /// The host asked for a demo that does not exist.
    #[error("unknown demo '{0}'")]
    UnknownDemo(String),

    /// Configuration JSON did not parse.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias using the crate error.
pub type Result<T, E = Error> = std::result::Result<T, E>;
