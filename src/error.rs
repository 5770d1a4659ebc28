use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ColorError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),

    #[error("color must have 6 hex digits: {0:?}")]
    BadLength(String),

    #[error("invalid hex digits in color {0:?}")]
    BadDigits(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter found")]
    NoAdapter,

    #[error("failed to acquire device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}
