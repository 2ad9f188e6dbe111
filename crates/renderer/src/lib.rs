//! Animated neural-field background renderer.
//!
//! ```text
//! mount(target, viewport, options)
//!        |  Auto: GpuBackend, else CpuBackend, else Disabled
//!        v
//! BackgroundRenderer
//!        |  tick()
//!        v
//! AnimationScheduler: apply pending resize -> sample clock -> render
//! ```
//!
//! [`mount`] probes for hardware access over the caller's raw window
//! handles and wires the surviving backend to an [`AnimationScheduler`].
//! The host event loop then drives [`BackgroundRenderer::tick`] for
//! frames, reports viewport changes through
//! [`BackgroundRenderer::notify_resize`], and finishes with
//! [`BackgroundRenderer::unmount`]. Backends absorb their own runtime
//! failures, so a mounted renderer never propagates errors mid-animation.

mod backend;
mod cpu;
mod error;
mod gpu;
mod scheduler;

pub use backend::{ActiveBackend, BackendKind, FrameOutcome, FrameState, RenderBackend};
pub use cpu::CpuBackend;
pub use error::InitError;
pub use gpu::GpuBackend;
pub use scheduler::{
    AnimationScheduler, BoxedTimeSource, FixedTimeSource, FramePacer, Phase, SystemTimeSource,
    TickOutcome, TimeSample, TimeSource,
};

use std::sync::Arc;
use std::time::Instant;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use cppn::{OscillatorBank, REFERENCE};

/// Fraction of the viewport the software working buffer covers by default.
pub const DEFAULT_CPU_SCALE: f64 = 0.15;

/// Frame-rate cap applied to the software path when the caller has not
/// chosen one.
pub const SOFTWARE_FPS_CAP: f32 = 15.0;

/// Which backend [`mount`] should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendPreference {
    /// Try hardware first, degrade to software, then to a disabled
    /// renderer. Never fails the mount.
    #[default]
    Auto,
    /// Hardware or nothing; initialization errors surface to the caller.
    ForceGpu,
    /// Software or nothing; initialization errors surface to the caller.
    ForceCpu,
}

/// Mount-time knobs. `Default` matches the upstream animation.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererOptions {
    pub backend: BackendPreference,
    /// Working buffer scale for the software path, in (0, 1].
    pub cpu_scale: f64,
    /// Oscillator bank driving the time-varying network features.
    pub oscillators: OscillatorBank,
    /// Optional frame-rate cap, enforced through [`FramePacer`].
    pub target_fps: Option<f32>,
    /// Freeze the clock at this timestamp instead of animating.
    pub still_time: Option<f64>,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            backend: BackendPreference::default(),
            cpu_scale: DEFAULT_CPU_SCALE,
            oscillators: OscillatorBank::default(),
            target_fps: None,
            still_time: None,
        }
    }
}

/// A mounted field renderer bound to one drawing target.
pub struct BackgroundRenderer<T> {
    kind: BackendKind,
    // Declared before `target` so backend surfaces drop before the raw
    // handles they were created from.
    scheduler: AnimationScheduler<ActiveBackend<T>>,
    target: Arc<T>,
}

impl<T> BackgroundRenderer<T>
where
    T: HasDisplayHandle + HasWindowHandle,
{
    /// Renders one frame if the scheduler is running.
    pub fn tick(&mut self) -> TickOutcome {
        self.scheduler.tick()
    }

    /// Defers a viewport change to the next tick boundary.
    pub fn notify_resize(&mut self, size: PhysicalSize<u32>) {
        self.scheduler.notify_resize(size);
    }

    /// Stops the animation and tears the backend down. Safe to repeat.
    pub fn unmount(&mut self) {
        self.scheduler.unmount();
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    /// Backend chosen at mount time; fixed for the renderer's lifetime.
    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    pub fn viewport(&self) -> PhysicalSize<u32> {
        self.scheduler.viewport()
    }

    /// True when the pacer allows another frame at `now`.
    pub fn ready_for_frame(&self, now: Instant) -> bool {
        self.scheduler.ready_for_frame(now)
    }

    /// Deadline for host loops that wait between capped frames.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// The drawing target this renderer was mounted on.
    pub fn target(&self) -> &Arc<T> {
        &self.target
    }
}

/// Builds a renderer over `target` and starts its animation clock.
///
/// Under [`BackendPreference::Auto`] every initialization failure degrades
/// to the next tier and the mount itself always succeeds; the `Force*`
/// preferences return the underlying [`InitError`] instead.
pub fn mount<T>(
    target: Arc<T>,
    viewport: PhysicalSize<u32>,
    options: RendererOptions,
) -> Result<BackgroundRenderer<T>, InitError>
where
    T: HasDisplayHandle + HasWindowHandle,
{
    let shader_source = cppn::wgsl::shader_source(&REFERENCE, &options.oscillators);

    let backend = match options.backend {
        BackendPreference::ForceGpu => {
            ActiveBackend::Gpu(GpuBackend::new(target.as_ref(), viewport, &shader_source)?)
        }
        BackendPreference::ForceCpu => ActiveBackend::Cpu(CpuBackend::new(
            Arc::clone(&target),
            viewport,
            options.cpu_scale,
            options.oscillators,
        )?),
        BackendPreference::Auto => {
            match GpuBackend::new(target.as_ref(), viewport, &shader_source) {
                Ok(gpu) => ActiveBackend::Gpu(gpu),
                Err(err) => {
                    tracing::warn!(error = %err, "hardware path unavailable; trying software");
                    match CpuBackend::new(
                        Arc::clone(&target),
                        viewport,
                        options.cpu_scale,
                        options.oscillators,
                    ) {
                        Ok(cpu) => ActiveBackend::Cpu(cpu),
                        Err(err) => {
                            tracing::error!(
                                error = %err,
                                "software path unavailable; renderer disabled"
                            );
                            ActiveBackend::Disabled
                        }
                    }
                }
            }
        }
    };

    let kind = backend.kind();
    let mut target_fps = options.target_fps;
    if kind == BackendKind::Cpu && target_fps.is_none() {
        tracing::info!(cap = SOFTWARE_FPS_CAP, "software rendering; capping frame rate");
        target_fps = Some(SOFTWARE_FPS_CAP);
    }

    let time_source: BoxedTimeSource = match options.still_time {
        Some(time) => Box::new(FixedTimeSource::new(time)),
        None => Box::new(SystemTimeSource::new()),
    };

    let scheduler = AnimationScheduler::new(backend, viewport, time_source, target_fps);
    tracing::info!(
        backend = %kind,
        width = viewport.width,
        height = viewport.height,
        "renderer mounted"
    );

    Ok(BackgroundRenderer {
        kind,
        scheduler,
        target,
    })
}
