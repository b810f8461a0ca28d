//! # Error Types
//!
//! Every fallible operation in the crate reports through one of the enums below instead of
//! logging and carrying on. The host decides what to do with them: the desktop [`crate::App`]
//! logs and keeps the window alive, an embedding host may tear the view down.
//!
//! - [`RendererError`]: GPU setup, shader/pipeline validation and per-frame surface failures.
//! - [`VideoError`]: video source startup and frame validation.
//! - [`MeshError`]: rejected sphere parameters.

/// Errors that can occur while setting up or driving the renderer.
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    #[error("device error: {0}")]
    Device(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),

    #[error("render pipeline link failed: {0}")]
    PipelineLink(String),

    #[error("gpu error after {op}: {message}")]
    Gpu { op: &'static str, message: String },

    #[error("gpu device lost")]
    ContextLost,

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

impl From<wgpu::SurfaceError> for RendererError {
    fn from(e: wgpu::SurfaceError) -> Self {
        RendererError::Surface(e.to_string())
    }
}

impl From<wgpu::RequestDeviceError> for RendererError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        RendererError::Device(e.to_string())
    }
}

impl From<wgpu::CreateSurfaceError> for RendererError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        RendererError::Surface(e.to_string())
    }
}

/// Errors reported by a [`crate::VideoSource`] or while validating decoded frames.
#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("failed to open video source {path}: {source}")]
    Open {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode video frame: {0}")]
    Decode(String),

    #[error("frame of {width}x{height} needs {expected} bytes, got {actual}")]
    InvalidFrame {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("unsupported video source: {0}")]
    Unsupported(String),
}

/// Rejected sphere mesh parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("sphere needs at least one latitude and one longitude step (got {tetta_steps}x{phi_steps})")]
    NoSteps { tetta_steps: u32, phi_steps: u32 },

    #[error("sphere radius must be positive and finite (got {0})")]
    InvalidRadius(f32),

    #[error("sphere of {tetta_steps}x{phi_steps} steps exceeds {max} vertices")]
    TooManyVertices {
        tetta_steps: u32,
        phi_steps: u32,
        max: usize,
    },
}
