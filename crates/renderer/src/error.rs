use thiserror::Error;

/// Failures that can occur while bringing a backend up.
///
/// Every variant is recoverable from the caller's point of view: under
/// [`BackendPreference::Auto`](crate::BackendPreference) a hardware failure
/// demotes the mount to the software path, and a software failure demotes it
/// to a disabled renderer that presents nothing. Only the `Force*`
/// preferences surface these values to the caller.
#[derive(Debug, Error)]
pub enum InitError {
    /// No adapter, device, or swapchain surface could be obtained.
    #[error("hardware acceleration unavailable: {0}")]
    HardwareUnavailable(String),

    /// The generated shader was rejected by the shader compiler.
    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),

    /// Shader stages compiled but the render pipeline failed validation.
    #[error("pipeline creation failed: {0}")]
    ProgramLink(String),

    /// A pixel buffer for software rendering could not be allocated.
    #[error("buffer allocation failed: {0}")]
    BufferAlloc(String),

    /// The drawing target refused to hand out raw window or display handles.
    #[error("drawing target handle unavailable: {0}")]
    TargetHandle(#[from] raw_window_handle::HandleError),

    /// The software presentation surface could not be created.
    #[error("software surface unavailable: {0}")]
    SoftwareSurface(#[from] softbuffer::SoftBufferError),
}
