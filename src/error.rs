//! Error taxonomy for the monitoring pipeline.
//!
//! Neither error is fatal. Device errors stop capture from starting and are
//! shown to the user; classifier errors are absorbed by the fallback sampler.

use thiserror::Error;

/// The camera could not be acquired.
#[derive(Debug, Error)]
pub enum DeviceAccessError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("no camera available: {0}")]
    NotFound(String),
    #[error("camera error: {0}")]
    Device(String),
}

impl DeviceAccessError {
    /// Classify an I/O error raised while opening a device node.
    pub fn from_io(source: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                DeviceAccessError::PermissionDenied(format!("{}: {}", source, err))
            }
            std::io::ErrorKind::NotFound => {
                DeviceAccessError::NotFound(format!("{}: {}", source, err))
            }
            _ => DeviceAccessError::Device(format!("{}: {}", source, err)),
        }
    }
}

/// The classifier did not produce a usable result.
#[derive(Debug, Error)]
pub enum ClassifierUnavailable {
    #[error("classifier request failed: {0}")]
    Transport(String),
    #[error("classifier returned HTTP {0}")]
    Status(u16),
    #[error("malformed classifier response: {0}")]
    Malformed(String),
    #[error("classifier offline")]
    Offline,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_device_errors() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            DeviceAccessError::from_io("/dev/video0", &denied),
            DeviceAccessError::PermissionDenied(_)
        ));
        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        let err = DeviceAccessError::from_io("/dev/video9", &missing);
        assert!(err.to_string().starts_with("no camera available: /dev/video9"));
    }
}
