//! Synthetic camera (`stub://...`) for tests and demos.
//!
//! Two reserved hosts simulate acquisition failures:
//! - `stub://denied`  -> permission refused
//! - `stub://missing` -> no device present

use anyhow::{anyhow, Result};

use super::{FrameSource, SourceStats};
use crate::error::DeviceAccessError;
use crate::frame::Frame;

/// Frames reported as "not decoded yet" right after acquisition.
const DEFAULT_WARMUP_FRAMES: u64 = 1;

pub struct SyntheticCamera {
    source: String,
    width: u32,
    height: u32,
    acquired: bool,
    warmup_frames: u64,
    frames_since_acquire: u64,
    frame_count: u64,
    /// Simulated scene state, advanced every 50 frames.
    scene_state: u8,
}

impl SyntheticCamera {
    pub fn new(source: &str, width: u32, height: u32) -> Self {
        Self {
            source: source.to_string(),
            width,
            height,
            acquired: false,
            warmup_frames: DEFAULT_WARMUP_FRAMES,
            frames_since_acquire: 0,
            frame_count: 0,
            scene_state: 0,
        }
    }

    /// Override how many captures after `acquire` come back empty.
    pub fn with_warmup(mut self, frames: u64) -> Self {
        self.warmup_frames = frames;
        self
    }

    fn generate_synthetic_pixels(&mut self) -> Result<Vec<u8>> {
        let pixel_count = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("{}x{} frame is too large", self.width, self.height))?;
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }
        Ok(pixels)
    }
}

impl FrameSource for SyntheticCamera {
    fn describe(&self) -> String {
        format!("{} (synthetic)", self.source)
    }

    fn acquire(&mut self) -> Result<(), DeviceAccessError> {
        match self.source.as_str() {
            "stub://denied" => {
                return Err(DeviceAccessError::PermissionDenied(format!(
                    "{} refused access",
                    self.source
                )))
            }
            "stub://missing" => {
                return Err(DeviceAccessError::NotFound(self.source.clone()));
            }
            _ => {}
        }
        self.acquired = true;
        self.frames_since_acquire = 0;
        log::info!("camera: acquired {}", self.describe());
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame> {
        if !self.acquired {
            return Err(anyhow!("{} not acquired; call acquire() first", self.source));
        }
        self.frames_since_acquire += 1;
        if self.frames_since_acquire <= self.warmup_frames {
            return Frame::from_rgb(Vec::new(), 0, 0);
        }
        self.frame_count += 1;
        let pixels = self.generate_synthetic_pixels()?;
        Frame::from_rgb(pixels, self.width, self.height)
    }

    fn release(&mut self) {
        if self.acquired {
            log::info!("camera: released {}", self.describe());
        }
        self.acquired = false;
    }

    fn is_acquired(&self) -> bool {
        self.acquired
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.source.clone(),
        }
    }
}
