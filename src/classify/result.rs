use serde::{Deserialize, Serialize};

use crate::score::{ChannelScores, RawValue, RiskScore};

/// Output of one classification, real or synthetic.
///
/// `drowsiness`, `phone` and `smoking` are required on the wire. Backends
/// report the drinking channel as either `drinking` or `drink`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierResult {
    pub drowsiness: RawValue,
    pub phone: RawValue,
    pub smoking: RawValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drinking: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drink: Option<RawValue>,
}

impl ClassifierResult {
    /// Build a result from four category strings.
    pub fn from_labels(drowsiness: &str, phone: &str, drinking: &str, smoking: &str) -> Self {
        Self {
            drowsiness: RawValue::text(drowsiness),
            phone: RawValue::text(phone),
            smoking: RawValue::text(smoking),
            drinking: Some(RawValue::text(drinking)),
            drink: None,
        }
    }

    /// Effective drinking input: `drinking`, else `drink`, else "No".
    pub fn drinking_input(&self) -> RawValue {
        [&self.drinking, &self.drink]
            .into_iter()
            .flatten()
            .find(|value| value.is_truthy())
            .cloned()
            .unwrap_or_else(|| RawValue::text("No"))
    }

    /// Normalize every channel.
    pub fn scores(&self) -> ChannelScores {
        ChannelScores {
            drowsiness: RiskScore::from_raw(&self.drowsiness),
            phone: RiskScore::from_raw(&self.phone),
            drinking: RiskScore::from_raw(&self.drinking_input()),
            smoking: RiskScore::from_raw(&self.smoking),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::RiskLabel;

    #[test]
    fn parses_categorical_response() {
        let json = r#"{"drowsiness":"high","drinking":"No","phone":"medium","smoking":"No"}"#;
        let result: ClassifierResult = serde_json::from_str(json).unwrap();
        let scores = result.scores();
        assert_eq!(scores.drowsiness.value, 85);
        assert_eq!(scores.phone.value, 55);
        assert_eq!(scores.drinking.value, 4);
        assert_eq!(scores.smoking.label, RiskLabel::No);
    }

    #[test]
    fn parses_numeric_response_with_drink_alias() {
        let json = r#"{"drowsiness":0.12,"phone":0.9,"smoking":0,"drink":0.61}"#;
        let result: ClassifierResult = serde_json::from_str(json).unwrap();
        let scores = result.scores();
        assert_eq!(scores.drowsiness.value, 12);
        assert_eq!(scores.phone.value, 90);
        assert_eq!(scores.smoking.value, 0);
        assert_eq!(scores.smoking.label, RiskLabel::None);
        assert_eq!(scores.drinking.value, 61);
    }

    #[test]
    fn missing_required_channel_is_rejected() {
        let json = r#"{"drowsiness":"No","phone":"No"}"#;
        assert!(serde_json::from_str::<ClassifierResult>(json).is_err());
    }

    #[test]
    fn drinking_falls_back_to_drink_then_no() {
        let mut result = ClassifierResult::from_labels("No", "No", "", "No");
        result.drink = Some(RawValue::text("Yes"));
        assert_eq!(result.drinking_input(), RawValue::text("Yes"));

        result.drink = None;
        assert_eq!(result.drinking_input(), RawValue::text("No"));

        // A zero confidence is falsy and also falls through.
        result.drinking = Some(RawValue::Number(0.0));
        assert_eq!(result.scores().drinking.value, 4);
    }
}
