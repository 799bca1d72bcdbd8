//! Risk score normalization.
//!
//! Classifier output arrives either as a numeric confidence (0.0..=1.0) or as a
//! free-text category ("No", "Low", "Medium", "High", "Yes", ...). Everything
//! downstream works on a single 0..=100 integer per channel plus a discrete label.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Score assigned to text containing "no".
pub const SCORE_NO: u8 = 4;
/// Score assigned to text containing "low".
pub const SCORE_LOW: u8 = 30;
/// Score assigned to text containing "medium".
pub const SCORE_MEDIUM: u8 = 55;
/// Score assigned to text containing "high" or "yes".
pub const SCORE_HIGH: u8 = 85;

/// One raw classifier value as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    /// Anything else the backend sends (null, bool, object). Scores as 0.
    Other(serde_json::Value),
}

impl RawValue {
    pub fn text(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }

    /// Truthiness used when picking between `drinking` / `drink`.
    ///
    /// Zero, NaN, the empty string, null and false are all falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            RawValue::Number(n) => *n != 0.0 && !n.is_nan(),
            RawValue::Text(s) => !s.is_empty(),
            RawValue::Other(serde_json::Value::Null) => false,
            RawValue::Other(serde_json::Value::Bool(b)) => *b,
            RawValue::Other(_) => true,
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::text(value)
    }
}

/// Map a raw classifier value to a 0..=100 score.
///
/// Numeric inputs are scaled by 100 and rounded half-up, then clamped into
/// 0..=100 (NaN scores 0). Text inputs are matched case-insensitively by
/// substring in a fixed order: "no" first, then "low", "medium", and finally
/// "high"/"yes". Unmatched text and non-scalar values score 0.
pub fn normalize(raw: &RawValue) -> u8 {
    match raw {
        RawValue::Number(n) => {
            if n.is_nan() {
                return 0;
            }
            let scaled = (n * 100.0 + 0.5).floor();
            scaled.clamp(0.0, 100.0) as u8
        }
        RawValue::Text(s) => {
            let lower = s.to_lowercase();
            if lower.contains("no") {
                SCORE_NO
            } else if lower.contains("low") {
                SCORE_LOW
            } else if lower.contains("medium") {
                SCORE_MEDIUM
            } else if lower.contains("high") || lower.contains("yes") {
                SCORE_HIGH
            } else {
                0
            }
        }
        RawValue::Other(_) => 0,
    }
}

/// Discrete risk label derived from a score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Score of exactly zero (nothing reported).
    None,
    No,
    Low,
    Medium,
    High,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::None => "—",
            RiskLabel::No => "No",
            RiskLabel::Low => "Low",
            RiskLabel::Medium => "Medium",
            RiskLabel::High => "High",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step function from score to label. No hysteresis.
pub fn label_from_value(score: u8) -> RiskLabel {
    match score {
        0 => RiskLabel::None,
        1..=24 => RiskLabel::No,
        25..=49 => RiskLabel::Low,
        50..=74 => RiskLabel::Medium,
        _ => RiskLabel::High,
    }
}

/// A monitored behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Drowsiness,
    Phone,
    Drinking,
    Smoking,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Drowsiness,
        Channel::Phone,
        Channel::Drinking,
        Channel::Smoking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Drowsiness => "drowsiness",
            Channel::Phone => "phone",
            Channel::Drinking => "drinking",
            Channel::Smoking => "smoking",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized score for one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RiskScore {
    pub value: u8,
    pub label: RiskLabel,
}

impl RiskScore {
    pub fn new(value: u8) -> Self {
        Self {
            value,
            label: label_from_value(value),
        }
    }

    pub fn from_raw(raw: &RawValue) -> Self {
        Self::new(normalize(raw))
    }
}

/// Scores for all four channels from a single tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ChannelScores {
    pub drowsiness: RiskScore,
    pub phone: RiskScore,
    pub drinking: RiskScore,
    pub smoking: RiskScore,
}

impl ChannelScores {
    pub fn from_values(drowsiness: u8, phone: u8, drinking: u8, smoking: u8) -> Self {
        Self {
            drowsiness: RiskScore::new(drowsiness),
            phone: RiskScore::new(phone),
            drinking: RiskScore::new(drinking),
            smoking: RiskScore::new(smoking),
        }
    }

    pub fn get(&self, channel: Channel) -> RiskScore {
        match channel {
            Channel::Drowsiness => self.drowsiness,
            Channel::Phone => self.phone,
            Channel::Drinking => self.drinking,
            Channel::Smoking => self.smoking,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, RiskScore)> + '_ {
        Channel::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}
