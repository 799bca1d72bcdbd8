use std::collections::VecDeque;

use crate::classify::backend::Classifier;
use crate::classify::result::ClassifierResult;
use crate::error::ClassifierUnavailable;

/// Deterministic classifier that replays a queue of canned outcomes.
///
/// `None` entries simulate a backend failure. Once the queue is exhausted the
/// last outcome repeats; an empty script is permanently offline.
pub struct ScriptedClassifier {
    script: VecDeque<Option<ClassifierResult>>,
    last: Option<ClassifierResult>,
    calls: u64,
}

impl ScriptedClassifier {
    pub fn new(script: impl IntoIterator<Item = Option<ClassifierResult>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: None,
            calls: 0,
        }
    }

    /// A classifier that always fails.
    pub fn offline() -> Self {
        Self::new(std::iter::empty())
    }

    /// A classifier that always returns `result`.
    pub fn constant(result: ClassifierResult) -> Self {
        Self::new([Some(result)])
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl Classifier for ScriptedClassifier {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn classify(&mut self, _frame_data_uri: &str) -> Result<ClassifierResult, ClassifierUnavailable> {
        self.calls += 1;
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last.clone().ok_or(ClassifierUnavailable::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_script_then_repeats_last() {
        let high = ClassifierResult::from_labels("High", "No", "No", "No");
        let mut classifier = ScriptedClassifier::new([Some(high.clone()), None]);
        assert_eq!(classifier.classify("").unwrap(), high);
        assert!(classifier.classify("").is_err());
        assert!(classifier.classify("").is_err());
        assert_eq!(classifier.calls(), 3);
    }

    #[test]
    fn offline_always_fails() {
        let mut classifier = ScriptedClassifier::offline();
        assert!(matches!(
            classifier.classify(""),
            Err(ClassifierUnavailable::Offline)
        ));
    }
}
