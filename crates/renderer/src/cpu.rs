//! Software realization of the field renderer.
//!
//! Evaluates the reduced network into a downscaled working buffer, scales
//! the result up to the viewport with a Catmull-Rom filter, and presents
//! through a shared-memory surface. Evaluating at a fraction of the
//! viewport keeps a full-screen animation affordable without a GPU; the
//! upscale doubles as a soft blur that hides the low sample density.

use std::num::NonZeroU32;
use std::sync::Arc;

use fast_image_resize as fir;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use cppn::{OscillatorBank, ReducedWeights, REDUCED};

use crate::backend::{FrameOutcome, FrameState};
use crate::error::InitError;

/// Downscaled RGBA field the reduced network is evaluated into.
///
/// Rows run top to bottom while field y grows upward, so the fill loop
/// flips y as it walks rows. Row 0 samples y = +1, matching the hardware
/// path where clip-space y points up.
pub(crate) struct WorkingBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl WorkingBuffer {
    /// Working dimensions for a viewport at `scale`, rounded up and never
    /// below 1x1.
    pub(crate) fn dimensions_for(viewport: PhysicalSize<u32>, scale: f64) -> (u32, u32) {
        let width = ((f64::from(viewport.width) * scale).ceil() as u32).max(1);
        let height = ((f64::from(viewport.height) * scale).ceil() as u32).max(1);
        (width, height)
    }

    pub(crate) fn new(viewport: PhysicalSize<u32>, scale: f64) -> Result<Self, InitError> {
        let (width, height) = Self::dimensions_for(viewport, scale);
        let pixels = allocate_bytes(width as usize * height as usize * 4)?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reallocates for a new viewport. Returns true when the working
    /// dimensions actually changed.
    pub(crate) fn resize(
        &mut self,
        viewport: PhysicalSize<u32>,
        scale: f64,
    ) -> Result<bool, InitError> {
        let (width, height) = Self::dimensions_for(viewport, scale);
        if width == self.width && height == self.height {
            return Ok(false);
        }
        self.pixels = allocate_bytes(width as usize * height as usize * 4)?;
        self.width = width;
        self.height = height;
        Ok(true)
    }

    /// Evaluates the reduced network once per working pixel.
    pub(crate) fn fill(&mut self, weights: &ReducedWeights, drive: [f32; 3]) {
        let width = self.width as usize;
        let height = self.height as usize;
        for row in 0..height {
            // Pixel rows grow downward while field y grows upward.
            let y = -((row as f32 / height as f32) * 2.0 - 1.0);
            let base = row * width * 4;
            for col in 0..width {
                let x = (col as f32 / width as f32) * 2.0 - 1.0;
                let rgb = cppn::eval_reduced(weights, x, y, drive);
                let at = base + col * 4;
                self.pixels[at] = channel_byte(rgb[0]);
                self.pixels[at + 1] = channel_byte(rgb[1]);
                self.pixels[at + 2] = channel_byte(rgb[2]);
                self.pixels[at + 3] = u8::MAX;
            }
        }
    }
}

/// Quantizes a [0, 1] channel to a byte by flooring; only an exact 1.0
/// lands on 255.
fn channel_byte(value: f32) -> u8 {
    (value * 255.0).floor() as u8
}

/// Packs an RGBA byte quad into the `0x00RRGGBB` pixel softbuffer expects.
fn pack_pixel(px: &[u8]) -> u32 {
    (u32::from(px[0]) << 16) | (u32::from(px[1]) << 8) | u32::from(px[2])
}

fn allocate_bytes(len: usize) -> Result<Vec<u8>, InitError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|err| InitError::BufferAlloc(err.to_string()))?;
    buffer.resize(len, 0);
    Ok(buffer)
}

/// Viewport-sized destination image for the upscale, over a fallibly
/// reserved buffer.
fn upscale_target(width: u32, height: u32) -> Result<fir::images::Image<'static>, InitError> {
    let bytes = allocate_bytes(width as usize * height as usize * 4)?;
    fir::images::Image::from_vec_u8(width, height, bytes, fir::PixelType::U8x4)
        .map_err(|err| InitError::BufferAlloc(err.to_string()))
}

fn surface_extent(width: u32, height: u32) -> (NonZeroU32, NonZeroU32) {
    (
        NonZeroU32::new(width).unwrap_or(NonZeroU32::MIN),
        NonZeroU32::new(height).unwrap_or(NonZeroU32::MIN),
    )
}

/// Software pipeline over a shared-memory surface.
pub struct CpuBackend<T> {
    // Field order: the surface must drop before the context it came from.
    surface: softbuffer::Surface<Arc<T>, Arc<T>>,
    _context: softbuffer::Context<Arc<T>>,
    working: WorkingBuffer,
    resizer: fir::Resizer,
    upscaled: fir::images::Image<'static>,
    shown: Vec<u32>,
    oscillators: OscillatorBank,
    scale: f64,
    viewport: PhysicalSize<u32>,
    muted: bool,
}

impl<T> CpuBackend<T>
where
    T: HasDisplayHandle + HasWindowHandle,
{
    pub(crate) fn new(
        target: Arc<T>,
        viewport: PhysicalSize<u32>,
        scale: f64,
        oscillators: OscillatorBank,
    ) -> Result<Self, InitError> {
        let context = softbuffer::Context::new(Arc::clone(&target))?;
        let mut surface = softbuffer::Surface::new(&context, target)?;

        let width = viewport.width.max(1);
        let height = viewport.height.max(1);
        let (buffer_width, buffer_height) = surface_extent(width, height);
        surface.resize(buffer_width, buffer_height)?;

        let working = WorkingBuffer::new(viewport, scale)?;
        let upscaled = upscale_target(width, height)?;
        let pixel_count = width as usize * height as usize;
        let mut shown = Vec::new();
        shown
            .try_reserve_exact(pixel_count)
            .map_err(|err| InitError::BufferAlloc(err.to_string()))?;
        shown.resize(pixel_count, 0);

        tracing::info!(
            width,
            height,
            working_width = working.width(),
            working_height = working.height(),
            "software backend ready"
        );

        Ok(Self {
            surface,
            _context: context,
            working,
            resizer: fir::Resizer::new(),
            upscaled,
            shown,
            oscillators,
            scale,
            viewport: PhysicalSize::new(width, height),
            muted: false,
        })
    }

    /// Resizes the presentation surface and reallocates the pixel buffers.
    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let viewport = PhysicalSize::new(width, height);
        if viewport == self.viewport {
            return;
        }

        let (buffer_width, buffer_height) = surface_extent(width, height);
        if let Err(err) = self.surface.resize(buffer_width, buffer_height) {
            tracing::error!(error = %err, "software surface rejected resize; output muted");
            self.muted = true;
            return;
        }
        if let Err(err) = self.working.resize(viewport, self.scale) {
            tracing::error!(error = %err, "working buffer reallocation failed; output muted");
            self.muted = true;
            return;
        }

        let pixel_count = width as usize * height as usize;
        self.shown.clear();
        if let Err(err) = self.shown.try_reserve_exact(pixel_count) {
            tracing::error!(error = %err, "frame buffer reallocation failed; output muted");
            self.muted = true;
            return;
        }
        self.shown.resize(pixel_count, 0);
        self.upscaled = match upscale_target(width, height) {
            Ok(upscaled) => upscaled,
            Err(err) => {
                tracing::error!(error = %err, "upscale buffer reallocation failed; output muted");
                self.muted = true;
                return;
            }
        };
        self.viewport = viewport;
        tracing::debug!(
            width,
            height,
            working_width = self.working.width(),
            working_height = self.working.height(),
            "software backend resized"
        );
    }

    /// Fills the working buffer for this instant, upscales, and presents.
    pub(crate) fn render_frame(&mut self, frame: &FrameState) -> FrameOutcome {
        if self.muted {
            return FrameOutcome::Skipped;
        }

        let drive = self.oscillators.drive(frame.elapsed_seconds);
        self.working.fill(&REDUCED, drive);

        if self.working.width() == self.viewport.width
            && self.working.height() == self.viewport.height
        {
            self.shown.clear();
            self.shown
                .extend(self.working.pixels().chunks_exact(4).map(pack_pixel));
        } else {
            let source = match fir::images::ImageRef::new(
                self.working.width(),
                self.working.height(),
                self.working.pixels(),
                fir::PixelType::U8x4,
            ) {
                Ok(source) => source,
                Err(err) => {
                    tracing::warn!(error = %err, "working buffer view rejected; dropping frame");
                    return FrameOutcome::Skipped;
                }
            };
            let options = fir::ResizeOptions::new()
                .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
            if let Err(err) = self
                .resizer
                .resize(&source, &mut self.upscaled, Some(&options))
            {
                tracing::warn!(error = %err, "upscale failed; dropping frame");
                return FrameOutcome::Skipped;
            }
            self.shown.clear();
            self.shown
                .extend(self.upscaled.buffer().chunks_exact(4).map(pack_pixel));
        }

        let mut buffer = match self.surface.buffer_mut() {
            Ok(buffer) => buffer,
            Err(err) => {
                tracing::warn!(error = %err, "software surface unavailable; dropping frame");
                return FrameOutcome::Skipped;
            }
        };
        if buffer.len() != self.shown.len() {
            // The surface changed size underneath us; wait for the resize
            // to arrive at the next tick boundary.
            tracing::debug!(
                buffer = buffer.len(),
                expected = self.shown.len(),
                "surface buffer size mismatch; dropping frame"
            );
            return FrameOutcome::Skipped;
        }
        buffer.copy_from_slice(&self.shown);
        match buffer.present() {
            Ok(()) => {
                tracing::trace!(frame = frame.frame_index, "presented software frame");
                FrameOutcome::Presented
            }
            Err(err) => {
                tracing::warn!(error = %err, "present failed; dropping frame");
                FrameOutcome::Skipped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_dimensions_round_up_and_stay_positive() {
        let dims = |w, h, s| WorkingBuffer::dimensions_for(PhysicalSize::new(w, h), s);
        assert_eq!(dims(800, 600, 0.15), (120, 90));
        assert_eq!(dims(1600, 900, 0.15), (240, 135));
        // 1001 * 0.15 = 150.15 and 333 * 0.15 = 49.95 both round up.
        assert_eq!(dims(1001, 333, 0.15), (151, 50));
        assert_eq!(dims(1, 1, 0.15), (1, 1));
        assert_eq!(dims(0, 0, 0.15), (1, 1));
    }

    #[test]
    fn working_buffer_resize_reports_changes_only() {
        let mut buffer = WorkingBuffer::new(PhysicalSize::new(800, 600), 0.15).unwrap();
        assert_eq!((buffer.width(), buffer.height()), (120, 90));
        assert_eq!(buffer.pixels().len(), 120 * 90 * 4);

        assert!(!buffer.resize(PhysicalSize::new(800, 600), 0.15).unwrap());

        assert!(buffer.resize(PhysicalSize::new(1600, 900), 0.15).unwrap());
        assert_eq!((buffer.width(), buffer.height()), (240, 135));
        assert_eq!(buffer.pixels().len(), 240 * 135 * 4);
    }

    #[test]
    fn upscale_target_matches_the_requested_dimensions() {
        let image = upscale_target(3, 2).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.buffer().len(), 3 * 2 * 4);
    }

    #[test]
    fn oversized_allocations_surface_buffer_errors() {
        assert!(matches!(
            allocate_bytes(usize::MAX),
            Err(InitError::BufferAlloc(_))
        ));
    }

    #[test]
    fn fill_writes_opaque_varied_pixels() {
        let mut buffer = WorkingBuffer::new(PhysicalSize::new(64, 48), 0.5).unwrap();
        buffer.fill(&REDUCED, [0.0; 3]);
        for px in buffer.pixels().chunks_exact(4) {
            assert_eq!(px[3], u8::MAX);
        }
        let first = buffer.pixels()[..3].to_vec();
        assert!(
            buffer
                .pixels()
                .chunks_exact(4)
                .any(|px| px[..3] != first[..]),
            "field collapsed to a single color"
        );
    }

    #[test]
    fn fill_maps_row_zero_to_the_top_of_the_field() {
        let mut buffer = WorkingBuffer::new(PhysicalSize::new(2, 2), 1.0).unwrap();
        buffer.fill(&REDUCED, [0.0; 3]);
        // Pixel (0, 0) must sample the field at (-1, +1).
        let top_left = cppn::eval_reduced(&REDUCED, -1.0, 1.0, [0.0; 3]);
        assert_eq!(buffer.pixels()[0], channel_byte(top_left[0]));
        assert_eq!(buffer.pixels()[1], channel_byte(top_left[1]));
        assert_eq!(buffer.pixels()[2], channel_byte(top_left[2]));
    }

    #[test]
    fn channel_byte_floors_into_the_full_range() {
        assert_eq!(channel_byte(0.0), 0);
        assert_eq!(channel_byte(0.5), 127);
        assert_eq!(channel_byte(0.999), 254);
        assert_eq!(channel_byte(1.0), 255);
    }

    #[test]
    fn pack_pixel_discards_alpha_and_orders_channels() {
        assert_eq!(pack_pixel(&[0xAB, 0xCD, 0xEF, 0xFF]), 0x00AB_CDEF);
        assert_eq!(pack_pixel(&[0, 0, 0, 0]), 0);
        assert_eq!(pack_pixel(&[255, 255, 255, 255]), 0x00FF_FFFF);
    }
}
