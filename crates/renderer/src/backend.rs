use std::fmt;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::cpu::CpuBackend;
use crate::gpu::GpuBackend;

/// Per-frame inputs handed from the scheduler to the active backend.
///
/// `elapsed_seconds` is derived from a monotonic clock sampled once per
/// tick, so both backends animate from the same timeline regardless of
/// how long the frame itself takes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub elapsed_seconds: f64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub frame_index: u64,
}

/// What a backend did with a frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was drawn and handed to the presentation surface.
    Presented,
    /// The frame was dropped; the backend stays usable for the next tick.
    Skipped,
}

/// Which realization of the field renderer is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Gpu,
    Cpu,
    Disabled,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Gpu => f.write_str("gpu"),
            BackendKind::Cpu => f.write_str("cpu"),
            BackendKind::Disabled => f.write_str("disabled"),
        }
    }
}

/// Common surface the scheduler drives.
///
/// Implementations own their presentation resources and absorb their own
/// runtime failures: a lost swapchain or an exhausted buffer must degrade
/// to [`FrameOutcome::Skipped`], never panic or propagate. Teardown is the
/// drop impl.
pub trait RenderBackend {
    fn kind(&self) -> BackendKind;

    /// Draws one frame of the field at `frame.elapsed_seconds`.
    fn render_frame(&mut self, frame: &FrameState) -> FrameOutcome;

    /// Tracks a viewport change. Called by the scheduler at tick boundaries
    /// only, never between render and present.
    fn resize(&mut self, width: u32, height: u32);
}

/// The backend chosen at mount time.
///
/// The variant is fixed for the lifetime of the mount; falling from
/// hardware to software happens only while mounting, never mid-animation.
pub enum ActiveBackend<T> {
    Gpu(GpuBackend),
    Cpu(CpuBackend<T>),
    /// Both paths failed to initialize. Renders nothing, accepts every call.
    Disabled,
}

impl<T> RenderBackend for ActiveBackend<T>
where
    T: HasDisplayHandle + HasWindowHandle,
{
    fn kind(&self) -> BackendKind {
        match self {
            ActiveBackend::Gpu(_) => BackendKind::Gpu,
            ActiveBackend::Cpu(_) => BackendKind::Cpu,
            ActiveBackend::Disabled => BackendKind::Disabled,
        }
    }

    fn render_frame(&mut self, frame: &FrameState) -> FrameOutcome {
        match self {
            ActiveBackend::Gpu(gpu) => gpu.render_frame(frame),
            ActiveBackend::Cpu(cpu) => cpu.render_frame(frame),
            ActiveBackend::Disabled => FrameOutcome::Skipped,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        match self {
            ActiveBackend::Gpu(gpu) => gpu.resize(width, height),
            ActiveBackend::Cpu(cpu) => cpu.resize(width, height),
            ActiveBackend::Disabled => {}
        }
    }
}
