use crate::error::ClassifierUnavailable;

use super::result::ClassifierResult;

/// A behavior classifier.
///
/// The capture loop hands each backend a JPEG frame encoded as a data URI and
/// expects the four-channel result back. Any failure is reported as
/// `ClassifierUnavailable`; callers decide how to recover.
pub trait Classifier: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Classify one encoded frame.
    fn classify(&mut self, frame_data_uri: &str) -> Result<ClassifierResult, ClassifierUnavailable>;
}
