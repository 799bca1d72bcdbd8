mod backend;
mod backends;
mod result;

pub use backend::Classifier;
pub use backends::{FallbackSampler, HttpClassifier, ScriptedClassifier};
pub use result::ClassifierResult;

use anyhow::Result;

use crate::config::ClassifierSettings;

/// Build the classifier named by the configured endpoint.
///
/// `http(s)://` endpoints talk to the remote service. `stub://offline` never
/// answers, which leaves every tick on the fallback path.
pub fn classifier_for(settings: &ClassifierSettings) -> Result<Box<dyn Classifier>> {
    if settings.url.starts_with("stub://") {
        log::info!("classifier {} is offline; using fallback samples", settings.url);
        return Ok(Box::new(ScriptedClassifier::offline()));
    }
    let classifier = HttpClassifier::new(&settings.url, settings.timeout)?;
    log::info!(
        "classifier endpoint {} (timeout {}ms)",
        classifier.url(),
        settings.timeout.as_millis()
    );
    Ok(Box::new(classifier))
}
