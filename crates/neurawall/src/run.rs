//! Tracing bootstrap and the winit event loop that hosts the renderer.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use renderer::{BackendKind, RendererOptions};
use tracing_subscriber::EnvFilter;
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::cli::Cli;
use crate::snapshot;

/// Installs the global tracing subscriber, honouring `RUST_LOG` when set.
pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(args: Cli) -> Result<()> {
    let (width, height) = args.size;

    if let Some(path) = args.export.as_deref() {
        snapshot::export_png(path, width, height, args.still.unwrap_or(0.0))?;
        tracing::info!("still frame captured at {}", path.display());
        return Ok(());
    }

    let options = RendererOptions {
        backend: args.backend,
        cpu_scale: args.cpu_scale.unwrap_or(renderer::DEFAULT_CPU_SCALE),
        target_fps: match args.fps {
            Some(value) if value > 0.0 => Some(value),
            _ => None,
        },
        still_time: args.still,
        ..RendererOptions::default()
    };

    run_window(PhysicalSize::new(width, height), &args.title, options)
}

/// Opens the window and drives the `winit` event loop until close.
fn run_window(size: PhysicalSize<u32>, title: &str, options: RendererOptions) -> Result<()> {
    // A pinned clock repeats the same image, so render on demand only.
    let animate = options.still_time.is_none();

    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(size)
        .build(&event_loop)
        .context("failed to create window")?;
    let window = Arc::new(window);

    let mut renderer = renderer::mount(window.clone(), window.inner_size(), options)
        .map_err(|err| anyhow!("failed to mount background renderer: {err}"))?;
    if renderer.backend_kind() == BackendKind::Disabled {
        tracing::warn!("no usable backend; the window will stay black");
    }
    window.request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    renderer.unmount();
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    renderer.notify_resize(new_size);
                }
                WindowEvent::ScaleFactorChanged {
                    mut inner_size_writer,
                    ..
                } => {
                    // Keep the current size when the scale factor changes.
                    let _ = inner_size_writer.request_inner_size(renderer.viewport());
                }
                WindowEvent::RedrawRequested => {
                    renderer.tick();
                }
                _ => {}
            },
            Event::AboutToWait => {
                if !animate {
                    elwt.set_control_flow(ControlFlow::Wait);
                    return;
                }
                let now = Instant::now();
                if renderer.ready_for_frame(now) {
                    window.request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = renderer.next_deadline() {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                } else {
                    elwt.set_control_flow(ControlFlow::Wait);
                }
            }
            _ => {}
        })
        .map_err(|err| anyhow!("event loop error: {err}"))
}
