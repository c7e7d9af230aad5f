mod ffmpeg;

pub use ffmpeg::{FfmpegCapture, FfmpegConfig};

use crate::error::Result;
use image::RgbaImage;

/// Trait for single-frame camera sources
pub trait CaptureSource {
    /// Capture one still frame, returned still encoded (JPEG, PNG, ...)
    ///
    /// Blocks until the frame is available. There is no timeout.
    fn capture_frame(&mut self) -> Result<Vec<u8>>;
}

/// Decode an encoded frame into an RGBA raster, sniffing the format
pub fn decode_frame(bytes: &[u8]) -> Result<RgbaImage> {
    let _span = tracing::debug_span!("decode", bytes = bytes.len()).entered();

    let image = image::load_from_memory(bytes)?;
    Ok(image.into_rgba8())
}
