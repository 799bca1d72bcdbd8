//! V4L2 camera (feature: camera-v4l2).
//!
//! Opens a local device node (e.g. /dev/video0), requests packed RGB and
//! memory-maps a small ring of capture buffers. Releasing the source drops the
//! stream and closes the device, which stops the camera.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use super::{FrameSource, SourceStats};
use crate::error::DeviceAccessError;
use crate::frame::Frame;

const CAPTURE_BUFFERS: u32 = 4;

pub struct V4l2Camera {
    device: String,
    width: u32,
    height: u32,
    state: Option<DeviceState>,
    frame_count: u64,
    active_width: u32,
    active_height: u32,
}

#[self_referencing]
struct DeviceState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Camera {
    pub fn new(device: &str, width: u32, height: u32) -> Self {
        Self {
            device: device.to_string(),
            width,
            height,
            state: None,
            frame_count: 0,
            active_width: width,
            active_height: height,
        }
    }
}

impl FrameSource for V4l2Camera {
    fn describe(&self) -> String {
        format!("{} (v4l2)", self.device)
    }

    fn acquire(&mut self) -> Result<(), DeviceAccessError> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.device)
            .map_err(|err| DeviceAccessError::from_io(&self.device, &err))?;
        let mut format = device
            .format()
            .map_err(|err| DeviceAccessError::from_io(&self.device, &err))?;
        format.width = self.width;
        format.height = self.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("camera: failed to set format on {}: {}", self.device, err);
                device
                    .format()
                    .map_err(|err| DeviceAccessError::from_io(&self.device, &err))?
            }
        };
        if format.fourcc != v4l::FourCC::new(b"RGB3") {
            return Err(DeviceAccessError::Device(format!(
                "{} does not support packed RGB capture (got {})",
                self.device, format.fourcc
            )));
        }

        self.active_width = format.width;
        self.active_height = format.height;

        let state = DeviceStateTryBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, CAPTURE_BUFFERS)
            },
        }
        .try_build()
        .map_err(|err| DeviceAccessError::from_io(&self.device, &err))?;
        self.state = Some(state);

        log::info!(
            "camera: acquired {} ({}x{})",
            self.device,
            self.active_width,
            self.active_height
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream;

        let state = self
            .state
            .as_mut()
            .ok_or_else(|| anyhow!("{} not acquired; call acquire() first", self.device))?;
        let pixels = state
            .with_stream_mut(|stream| stream.next().map(|(buf, _meta)| buf.to_vec()))
            .context("capture v4l2 frame")?;
        self.frame_count += 1;

        let expected = (self.active_width * self.active_height * 3) as usize;
        if pixels.len() < expected {
            // Driver handed back a short buffer; treat as not decoded yet.
            return Frame::from_rgb(Vec::new(), 0, 0);
        }
        let mut pixels = pixels;
        pixels.truncate(expected);
        Frame::from_rgb(pixels, self.active_width, self.active_height)
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            log::info!("camera: released {}", self.device);
        }
    }

    fn is_acquired(&self) -> bool {
        self.state.is_some()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.device.clone(),
        }
    }
}
