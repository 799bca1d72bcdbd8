//! Captured still frames.
//!
//! A `Frame` is one decoded RGB8 image grabbed from the camera on a tick. It
//! lives for exactly one tick: it is encoded to JPEG, wrapped as a data URI for
//! the classifier request, and dropped.

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

/// Default JPEG quality for classifier uploads (0.7 on a 0..1 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

/// One captured RGB8 still.
#[derive(Debug)]
pub struct Frame {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Wrap packed RGB8 pixels, validating the buffer length.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// True when the source has not decoded a picture yet.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Encode as baseline JPEG at `quality` (1..=100).
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        if self.is_empty() {
            return Err(anyhow!("cannot encode an empty frame"));
        }
        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
        encoder
            .encode(&self.pixels, self.width, self.height, ExtendedColorType::Rgb8)
            .context("encode frame as jpeg")?;
        Ok(out)
    }

    /// Encode as a `data:image/jpeg;base64,...` URI.
    pub fn to_data_uri(&self, quality: u8) -> Result<String> {
        let jpeg = self.encode_jpeg(quality)?;
        Ok(format!("data:image/jpeg;base64,{}", Base64.encode(jpeg)))
    }
}
