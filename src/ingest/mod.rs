//! Camera sources.
//!
//! This module provides the media sources the capture loop samples from:
//! - Synthetic camera (`stub://...`, testing and demos)
//! - Still image file (any other local path), replayed on every capture
//! - USB/V4L2 devices (`/dev/video*`, feature: camera-v4l2)
//!
//! Sources are acquired when capture starts and released when it stops.
//! Acquisition failures are reported as `DeviceAccessError`; everything after
//! that is a plain `anyhow` error that only costs the current tick.

pub mod still;
pub mod synthetic;
#[cfg(feature = "camera-v4l2")]
pub mod v4l2;

use anyhow::Result;

use crate::config::CameraSettings;
use crate::error::DeviceAccessError;
use crate::frame::Frame;

pub use still::StillImageSource;
pub use synthetic::SyntheticCamera;
#[cfg(feature = "camera-v4l2")]
pub use v4l2::V4l2Camera;

/// Anything the capture loop can grab stills from.
pub trait FrameSource {
    /// Human-readable source identifier for logs.
    fn describe(&self) -> String;

    /// Open the device. Must be called before `capture`.
    fn acquire(&mut self) -> Result<(), DeviceAccessError>;

    /// Grab the current picture. A zero-sized frame means nothing has been
    /// decoded yet.
    fn capture(&mut self) -> Result<Frame>;

    /// Stop all tracks and close the device. Idempotent.
    fn release(&mut self);

    fn is_acquired(&self) -> bool;

    fn stats(&self) -> SourceStats;
}

/// Statistics for a camera source.
#[derive(Clone, Debug, Default)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub source: String,
}

/// Camera selected from a source string.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    Still(StillImageSource),
    #[cfg(feature = "camera-v4l2")]
    V4l2(V4l2Camera),
}

impl CameraSource {
    pub fn new(settings: &CameraSettings) -> Result<Self> {
        let source = settings.source.trim();
        let backend = if source.starts_with("stub://") {
            CameraBackend::Synthetic(SyntheticCamera::new(source, settings.width, settings.height))
        } else if source.starts_with("/dev/video") {
            #[cfg(feature = "camera-v4l2")]
            {
                CameraBackend::V4l2(V4l2Camera::new(source, settings.width, settings.height))
            }
            #[cfg(not(feature = "camera-v4l2"))]
            {
                anyhow::bail!("camera device {} requires the camera-v4l2 feature", source)
            }
        } else if source.contains("://") {
            anyhow::bail!("unsupported camera source '{}'", source)
        } else {
            CameraBackend::Still(StillImageSource::new(source))
        };
        Ok(Self { backend })
    }
}

impl FrameSource for CameraSource {
    fn describe(&self) -> String {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.describe(),
            CameraBackend::Still(source) => source.describe(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::V4l2(source) => source.describe(),
        }
    }

    fn acquire(&mut self) -> Result<(), DeviceAccessError> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.acquire(),
            CameraBackend::Still(source) => source.acquire(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::V4l2(source) => source.acquire(),
        }
    }

    fn capture(&mut self) -> Result<Frame> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.capture(),
            CameraBackend::Still(source) => source.capture(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::V4l2(source) => source.capture(),
        }
    }

    fn release(&mut self) {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.release(),
            CameraBackend::Still(source) => source.release(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::V4l2(source) => source.release(),
        }
    }

    fn is_acquired(&self) -> bool {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.is_acquired(),
            CameraBackend::Still(source) => source.is_acquired(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::V4l2(source) => source.is_acquired(),
        }
    }

    fn stats(&self) -> SourceStats {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.stats(),
            CameraBackend::Still(source) => source.stats(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::V4l2(source) => source.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(source: &str) -> CameraSettings {
        CameraSettings {
            source: source.to_string(),
            ..CameraSettings::default()
        }
    }

    #[test]
    fn selects_backend_from_source_string() -> Result<()> {
        let stub = CameraSource::new(&settings("stub://front"))?;
        assert!(stub.describe().contains("synthetic"));
        let still = CameraSource::new(&settings("driver.jpg"))?;
        assert!(still.describe().contains("driver.jpg"));
        assert!(CameraSource::new(&settings("rtsp://cam/stream")).is_err());
        Ok(())
    }
}
