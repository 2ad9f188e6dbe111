//! Frame scheduling and animation lifecycle.
//!
//! The scheduler owns the mounted backend and is the only component that
//! calls into it. Each tick samples the clock once, applies at most one
//! deferred viewport change, and then asks the backend for a frame, so a
//! backend never observes a resize between rendering and presenting.

use std::time::{Duration, Instant};

use winit::dpi::PhysicalSize;

use crate::backend::{FrameOutcome, FrameState, RenderBackend};

/// Snapshot of the animation clock for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed seconds since the animation started.
    pub seconds: f64,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f64, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where animation time originates from.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Produces the time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
///
/// The origin is captured at construction, so the field animates from
/// zero at mount regardless of wall-clock adjustments.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample::new(self.origin.elapsed().as_secs_f64(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that always reports a fixed timestamp. Used to hold the
/// field still at a chosen instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f64,
}

impl FixedTimeSource {
    pub fn new(time: f64) -> Self {
        Self { time }
    }
}

impl TimeSource for FixedTimeSource {
    fn reset(&mut self) {}

    fn sample(&mut self) -> TimeSample {
        TimeSample::new(self.time, 0)
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Spaces frames to honor an optional FPS cap.
///
/// Without a cap every [`FramePacer::ready_for_frame`] answers true and
/// the host paces on its own redraw signal.
#[derive(Debug, Clone, Copy)]
pub struct FramePacer {
    interval: Option<Duration>,
    next_frame_at: Option<Instant>,
}

impl FramePacer {
    pub fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| *fps > 0.0)
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)));
        Self {
            interval,
            next_frame_at: None,
        }
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match self.next_frame_at {
            Some(deadline) => now >= deadline,
            None => true,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_frame_at
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.next_frame_at = self.interval.map(|interval| now + interval);
    }
}

/// Lifecycle of a mounted scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Stopped,
}

/// What a tick accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Rendered,
    Skipped,
    /// The scheduler is stopped; nothing happened.
    Stopped,
}

/// Drives a backend from mount to unmount.
///
/// The backend lives in an `Option` so that teardown releases it exactly
/// once; every entry point after that is a logged no-op, which makes late
/// host callbacks after shutdown harmless.
pub struct AnimationScheduler<B> {
    backend: Option<B>,
    time_source: BoxedTimeSource,
    pacer: FramePacer,
    viewport: PhysicalSize<u32>,
    pending_resize: Option<PhysicalSize<u32>>,
}

impl<B: RenderBackend> AnimationScheduler<B> {
    pub fn new(
        backend: B,
        viewport: PhysicalSize<u32>,
        time_source: BoxedTimeSource,
        target_fps: Option<f32>,
    ) -> Self {
        Self {
            backend: Some(backend),
            time_source,
            pacer: FramePacer::new(target_fps),
            viewport,
            pending_resize: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.backend.is_some() {
            Phase::Running
        } else {
            Phase::Stopped
        }
    }

    pub fn viewport(&self) -> PhysicalSize<u32> {
        self.viewport
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// Records a viewport change to apply at the next tick boundary.
    ///
    /// Resizes arriving after the scheduler stopped are dropped silently;
    /// hosts tend to emit a final resize while tearing their surface down.
    pub fn notify_resize(&mut self, size: PhysicalSize<u32>) {
        if self.backend.is_none() {
            tracing::debug!(
                width = size.width,
                height = size.height,
                "resize after stop ignored"
            );
            return;
        }
        if size.width == 0 || size.height == 0 {
            tracing::debug!("ignoring zero-sized resize");
            return;
        }
        self.pending_resize = Some(size);
    }

    /// Runs one frame: applies any pending resize, samples the clock, and
    /// renders.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(backend) = self.backend.as_mut() else {
            tracing::debug!("tick after stop ignored");
            return TickOutcome::Stopped;
        };

        if let Some(size) = self.pending_resize.take() {
            if size != self.viewport {
                backend.resize(size.width, size.height);
                self.viewport = size;
            }
        }

        let sample = self.time_source.sample();
        let frame = FrameState {
            elapsed_seconds: sample.seconds,
            viewport_width: self.viewport.width,
            viewport_height: self.viewport.height,
            frame_index: sample.frame_index,
        };
        let outcome = backend.render_frame(&frame);
        self.pacer.mark_rendered(Instant::now());

        match outcome {
            FrameOutcome::Presented => TickOutcome::Rendered,
            FrameOutcome::Skipped => TickOutcome::Skipped,
        }
    }

    /// True when the pacer allows another frame at `now`.
    pub fn ready_for_frame(&self, now: Instant) -> bool {
        self.backend.is_some() && self.pacer.ready_for_frame(now)
    }

    /// Deadline of the next allowed frame, if a cap is active.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pacer.next_deadline()
    }

    /// Stops the animation and releases the backend.
    ///
    /// Repeated calls are no-ops; the backend is dropped exactly once.
    pub fn unmount(&mut self) {
        match self.backend.take() {
            Some(backend) => {
                self.pending_resize = None;
                drop(backend);
                tracing::info!("animation stopped and resources released");
            }
            None => tracing::debug!("unmount repeated; already stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Render {
            width: u32,
            height: u32,
            frame: u64,
            seconds: f64,
        },
        Resize {
            width: u32,
            height: u32,
        },
        Teardown,
    }

    struct RecordingBackend {
        events: Rc<RefCell<Vec<Event>>>,
    }

    impl RecordingBackend {
        fn new() -> (Self, Rc<RefCell<Vec<Event>>>) {
            let events = Rc::new(RefCell::new(Vec::new()));
            (
                Self {
                    events: Rc::clone(&events),
                },
                events,
            )
        }
    }

    impl RenderBackend for RecordingBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Cpu
        }

        fn render_frame(&mut self, frame: &FrameState) -> FrameOutcome {
            self.events.borrow_mut().push(Event::Render {
                width: frame.viewport_width,
                height: frame.viewport_height,
                frame: frame.frame_index,
                seconds: frame.elapsed_seconds,
            });
            FrameOutcome::Presented
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.events.borrow_mut().push(Event::Resize { width, height });
        }
    }

    impl Drop for RecordingBackend {
        fn drop(&mut self) {
            self.events.borrow_mut().push(Event::Teardown);
        }
    }

    struct StepTimeSource {
        step: f64,
        ticks: u64,
    }

    impl StepTimeSource {
        fn new(step: f64) -> Self {
            Self { step, ticks: 0 }
        }
    }

    impl TimeSource for StepTimeSource {
        fn reset(&mut self) {
            self.ticks = 0;
        }

        fn sample(&mut self) -> TimeSample {
            let sample = TimeSample::new(self.step * self.ticks as f64, self.ticks);
            self.ticks += 1;
            sample
        }
    }

    fn scheduler_at(
        width: u32,
        height: u32,
    ) -> (
        AnimationScheduler<RecordingBackend>,
        Rc<RefCell<Vec<Event>>>,
    ) {
        let (backend, events) = RecordingBackend::new();
        let scheduler = AnimationScheduler::new(
            backend,
            PhysicalSize::new(width, height),
            Box::new(StepTimeSource::new(0.25)),
            None,
        );
        (scheduler, events)
    }

    #[test]
    fn ticks_render_in_order_with_monotonic_time() {
        let (mut scheduler, events) = scheduler_at(800, 600);
        assert_eq!(scheduler.phase(), Phase::Running);
        for _ in 0..3 {
            assert_eq!(scheduler.tick(), TickOutcome::Rendered);
        }
        assert_eq!(
            *events.borrow(),
            vec![
                Event::Render {
                    width: 800,
                    height: 600,
                    frame: 0,
                    seconds: 0.0
                },
                Event::Render {
                    width: 800,
                    height: 600,
                    frame: 1,
                    seconds: 0.25
                },
                Event::Render {
                    width: 800,
                    height: 600,
                    frame: 2,
                    seconds: 0.5
                },
            ]
        );
    }

    #[test]
    fn resize_lands_between_ticks() {
        let (mut scheduler, events) = scheduler_at(800, 600);
        for _ in 0..3 {
            scheduler.tick();
        }
        scheduler.notify_resize(PhysicalSize::new(1600, 900));
        for _ in 0..3 {
            scheduler.tick();
        }
        scheduler.unmount();

        let recorded = events.borrow();
        assert_eq!(recorded.len(), 8);
        assert_eq!(
            recorded[3],
            Event::Resize {
                width: 1600,
                height: 900
            }
        );
        for event in &recorded[4..7] {
            assert!(
                matches!(
                    event,
                    Event::Render {
                        width: 1600,
                        height: 900,
                        ..
                    }
                ),
                "render after resize saw stale dimensions: {event:?}"
            );
        }
        assert_eq!(recorded[7], Event::Teardown);
        assert_eq!(scheduler.viewport(), PhysicalSize::new(1600, 900));
    }

    #[test]
    fn pending_resizes_coalesce_to_the_last_one() {
        let (mut scheduler, events) = scheduler_at(800, 600);
        scheduler.tick();
        scheduler.notify_resize(PhysicalSize::new(1024, 768));
        scheduler.notify_resize(PhysicalSize::new(1024, 768));
        scheduler.tick();
        scheduler.notify_resize(PhysicalSize::new(640, 480));
        scheduler.notify_resize(PhysicalSize::new(640, 481));
        scheduler.tick();

        let resizes: Vec<Event> = events
            .borrow()
            .iter()
            .filter(|event| matches!(event, Event::Resize { .. }))
            .cloned()
            .collect();
        assert_eq!(
            resizes,
            vec![
                Event::Resize {
                    width: 1024,
                    height: 768
                },
                Event::Resize {
                    width: 640,
                    height: 481
                },
            ]
        );
    }

    #[test]
    fn resize_to_the_current_size_is_skipped() {
        let (mut scheduler, events) = scheduler_at(800, 600);
        scheduler.notify_resize(PhysicalSize::new(800, 600));
        scheduler.tick();
        assert!(events
            .borrow()
            .iter()
            .all(|event| !matches!(event, Event::Resize { .. })));
    }

    #[test]
    fn zero_sized_resizes_are_dropped() {
        let (mut scheduler, events) = scheduler_at(320, 200);
        scheduler.notify_resize(PhysicalSize::new(0, 200));
        scheduler.notify_resize(PhysicalSize::new(320, 0));
        scheduler.tick();
        assert!(events
            .borrow()
            .iter()
            .all(|event| !matches!(event, Event::Resize { .. })));
    }

    #[test]
    fn unmount_tears_down_exactly_once() {
        let (mut scheduler, events) = scheduler_at(320, 200);
        scheduler.tick();
        scheduler.unmount();
        scheduler.unmount();
        assert_eq!(scheduler.phase(), Phase::Stopped);
        let teardowns = events
            .borrow()
            .iter()
            .filter(|event| matches!(event, Event::Teardown))
            .count();
        assert_eq!(teardowns, 1);
    }

    #[test]
    fn unmount_before_the_first_tick_is_safe() {
        let (mut scheduler, events) = scheduler_at(320, 200);
        scheduler.unmount();
        assert_eq!(*events.borrow(), vec![Event::Teardown]);
    }

    #[test]
    fn stopped_scheduler_ignores_ticks_and_resizes() {
        let (mut scheduler, events) = scheduler_at(320, 200);
        scheduler.unmount();
        scheduler.notify_resize(PhysicalSize::new(640, 400));
        assert_eq!(scheduler.tick(), TickOutcome::Stopped);
        assert!(!scheduler.ready_for_frame(Instant::now()));
        assert_eq!(*events.borrow(), vec![Event::Teardown]);
    }

    #[test]
    fn uncapped_pacer_is_always_ready() {
        let pacer = FramePacer::new(None);
        assert!(pacer.ready_for_frame(Instant::now()));
        assert_eq!(pacer.next_deadline(), None);
    }

    #[test]
    fn capped_pacer_spaces_frames() {
        let mut pacer = FramePacer::new(Some(10.0));
        let start = Instant::now();
        assert!(pacer.ready_for_frame(start));

        pacer.mark_rendered(start);
        assert!(!pacer.ready_for_frame(start));
        assert!(!pacer.ready_for_frame(start + Duration::from_millis(99)));
        assert!(pacer.ready_for_frame(start + Duration::from_millis(100)));
        assert_eq!(
            pacer.next_deadline(),
            Some(start + Duration::from_millis(100))
        );
    }

    #[test]
    fn nonpositive_fps_caps_are_ignored() {
        let pacer = FramePacer::new(Some(0.0));
        assert_eq!(pacer.next_deadline(), None);
        assert!(pacer.ready_for_frame(Instant::now()));
    }

    #[test]
    fn system_time_source_counts_frames_and_never_rewinds() {
        let mut source = SystemTimeSource::new();
        let first = source.sample();
        let second = source.sample();
        assert_eq!(first.frame_index, 0);
        assert_eq!(second.frame_index, 1);
        assert!(second.seconds >= first.seconds);
    }

    #[test]
    fn fixed_time_source_pins_the_clock() {
        let mut source = FixedTimeSource::new(4.5);
        assert_eq!(source.sample(), TimeSample::new(4.5, 0));
        assert_eq!(source.sample(), TimeSample::new(4.5, 0));
    }
}
