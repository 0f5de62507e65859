// error.rs - 查看器错误类型

/// Errors raised while building or driving a viewer.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("shader compile failed: {0}")]
    ShaderCompile(String),
    #[error("program link failed: {0}")]
    ProgramLink(String),
    #[error("no usable GPU backend: {0}")]
    UnsupportedBackend(String),
    #[error("unknown vertex attribute: {0}")]
    UnknownAttribute(String),
    #[error("unknown uniform: {0}")]
    UnknownUniform(String),
    #[error("stale or foreign {0} handle")]
    InvalidHandle(&'static str),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
