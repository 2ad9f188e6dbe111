//! Offline still-frame capture.
//!
//! Exports evaluate the reference network on the host at the full target
//! resolution, so the output matches the hardware path rather than the
//! downscaled software preview.

use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageBuffer, Rgba};

/// Renders the field at `time` and writes it to `path` as a PNG.
pub fn export_png(path: &Path, width: u32, height: u32, time: f64) -> Result<()> {
    render_rgba(width, height, time)
        .save(path)
        .with_context(|| format!("failed to write still frame to {}", path.display()))
}

fn render_rgba(width: u32, height: u32, time: f64) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    ImageBuffer::from_fn(width, height, |col, row| {
        let x = (col as f32 / width as f32) * 2.0 - 1.0;
        // Pixel rows grow downward while field y grows upward.
        let y = -((row as f32 / height as f32) * 2.0 - 1.0);
        let [r, g, b] = cppn::evaluate(x, y, time);
        Rgba([channel_byte(r), channel_byte(g), channel_byte(b), u8::MAX])
    })
}

fn channel_byte(value: f32) -> u8 {
    (value * 255.0).floor() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_an_opaque_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        export_png(&path, 16, 9, 0.0).unwrap();

        let image = image::open(&path).unwrap().into_rgba8();
        assert_eq!(image.dimensions(), (16, 9));
        assert!(image.pixels().all(|px| px.0[3] == u8::MAX));
    }

    #[test]
    fn row_zero_is_the_top_of_the_field() {
        let image = render_rgba(4, 4, 0.0);
        let [r, g, b] = cppn::evaluate(-1.0, 1.0, 0.0);
        assert_eq!(
            image.get_pixel(0, 0).0,
            [channel_byte(r), channel_byte(g), channel_byte(b), u8::MAX]
        );
    }

    #[test]
    fn different_timestamps_produce_different_frames() {
        let early = render_rgba(8, 8, 0.0);
        let late = render_rgba(8, 8, 3.0);
        assert_ne!(early.as_raw(), late.as_raw());
    }
}
