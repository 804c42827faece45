//! Error taxonomy for pipeline construction and resource loading.

use std::path::PathBuf;

/// Errors raised while building or driving the ocean pipeline
#[derive(Debug, thiserror::Error)]
pub enum OceanError {
    /// Named resource does not exist under the resource root
    #[error("resource \"{name}\" not found (looked for {path})")]
    ResourceNotFound { name: String, path: PathBuf },

    /// Resource exists but could not be read
    #[error("cannot read resource {path}: {source}")]
    ResourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PNG resource could not be decoded
    #[error("cannot decode PNG resource {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Shader module or pipeline failed validation
    #[error("failed to build {label}: {message}")]
    ShaderBuild { label: String, message: String },

    /// Simulation resolution must be a power of two
    #[error("FFT resolution must be a power of two >= 2, got {0}")]
    InvalidResolution(u32),

    /// Grid mesh must have at least one cell per side
    #[error("grid size must be >= 1, got {0}")]
    InvalidGridSize(u32),

    /// Cubemap faces disagree in size or are not square
    #[error("invalid cubemap: {0}")]
    InvalidCubemap(String),

    #[error("no suitable GPU adapter found")]
    Adapter,

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("surface has no supported texture format")]
    UnsupportedSurface,

    /// Readback requested for something that is not exactly one field
    #[error("not a single simulation field: {0}")]
    UnknownField(String),

    /// Field readback buffer could not be mapped
    #[error("failed to map readback buffer: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),
}

/// Result alias used throughout the crate
pub type OceanResult<T> = Result<T, OceanError>;
