//! Still image camera.
//!
//! Decodes a local image file on acquire and hands out the same picture on
//! every capture. Useful for replaying a known scene against the classifier.

use anyhow::{anyhow, Result};
use image::ImageError;

use super::{FrameSource, SourceStats};
use crate::error::DeviceAccessError;
use crate::frame::Frame;

pub struct StillImageSource {
    path: String,
    image: Option<image::RgbImage>,
    frame_count: u64,
}

impl StillImageSource {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            image: None,
            frame_count: 0,
        }
    }
}

impl FrameSource for StillImageSource {
    fn describe(&self) -> String {
        format!("{} (still image)", self.path)
    }

    fn acquire(&mut self) -> Result<(), DeviceAccessError> {
        let decoded = image::open(&self.path).map_err(|err| match err {
            ImageError::IoError(io) => DeviceAccessError::from_io(&self.path, &io),
            other => DeviceAccessError::Device(format!("{}: {}", self.path, other)),
        })?;
        self.image = Some(decoded.to_rgb8());
        log::info!("camera: acquired {}", self.describe());
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame> {
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| anyhow!("{} not acquired; call acquire() first", self.path))?;
        self.frame_count += 1;
        Frame::from_rgb(image.as_raw().clone(), image.width(), image.height())
    }

    fn release(&mut self) {
        self.image = None;
    }

    fn is_acquired(&self) -> bool {
        self.image.is_some()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.path.clone(),
        }
    }
}
