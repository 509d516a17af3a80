use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Backend initialization failed: {0}")]
    BackendInit(String),

    #[error("Cannot start capture runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("Texture error: {0}")]
    Texture(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
