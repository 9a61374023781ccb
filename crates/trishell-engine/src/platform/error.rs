use super::GpuId;

/// Failures reported by the windowing layer or the graphics driver.
///
/// String payloads carry the platform's own diagnostic text.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("video subsystem initialization failed: {0}")]
    Video(String),

    #[error("window creation failed: {0}")]
    Window(String),

    #[error("rendering context creation failed: {0}")]
    Context(String),

    #[error("no rendering context is current")]
    NoContext,

    #[error("unknown or mismatched gpu object {0}")]
    UnknownObject(GpuId),

    #[error("shader compilation failed: {0}")]
    Shader(String),

    #[error("program link failed: {0}")]
    Link(String),

    #[error("frame presentation failed: {0}")]
    Present(String),
}
