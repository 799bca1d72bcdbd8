use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::classify::result::ClassifierResult;

/// Synthetic classifier output used while the real backend is unreachable.
///
/// Each channel is drawn independently on every call:
/// - drowsiness: "High" when a first draw exceeds 0.9, otherwise "Medium" when
///   a second draw exceeds 0.96, otherwise "No" (P = 0.10 / 0.036 / 0.864)
/// - phone: "High" with probability 0.05
/// - smoking: "Yes" with probability 0.02
/// - drinking: "Yes" with probability 0.01
pub struct FallbackSampler<R: Rng = StdRng> {
    rng: R,
}

impl FallbackSampler<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for FallbackSampler<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> FallbackSampler<R> {
    /// Sampler driven by a caller-supplied generator (seeded in tests).
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn sample(&mut self) -> ClassifierResult {
        let drowsiness = if self.rng.gen::<f64>() > 0.9 {
            "High"
        } else if self.rng.gen::<f64>() > 0.96 {
            "Medium"
        } else {
            "No"
        };
        let phone = if self.rng.gen::<f64>() > 0.95 { "High" } else { "No" };
        let smoking = if self.rng.gen::<f64>() > 0.98 { "Yes" } else { "No" };
        let drinking = if self.rng.gen::<f64>() > 0.99 { "Yes" } else { "No" };

        ClassifierResult::from_labels(drowsiness, phone, drinking, smoking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::RawValue;

    #[test]
    fn samples_have_full_shape() {
        let mut sampler = FallbackSampler::new();
        for _ in 0..100 {
            let result = sampler.sample();
            assert!(matches!(result.drowsiness, RawValue::Text(_)));
            assert!(result.drinking.is_some());
            let scores = result.scores();
            for (_, score) in scores.iter() {
                assert!([4, 55, 85].contains(&score.value));
            }
        }
    }

    #[test]
    fn drowsiness_uses_compound_probabilities() {
        let mut sampler = FallbackSampler::with_rng(StdRng::seed_from_u64(7));
        let n = 200_000;
        let (mut high, mut medium) = (0u32, 0u32);
        let (mut phone, mut smoking, mut drinking) = (0u32, 0u32, 0u32);
        for _ in 0..n {
            let scores = sampler.sample().scores();
            match scores.drowsiness.value {
                85 => high += 1,
                55 => medium += 1,
                _ => {}
            }
            phone += (scores.phone.value == 85) as u32;
            smoking += (scores.smoking.value == 85) as u32;
            drinking += (scores.drinking.value == 85) as u32;
        }
        let rate = |count: u32| count as f64 / n as f64;
        assert!((rate(high) - 0.10).abs() < 0.005, "high {}", rate(high));
        assert!((rate(medium) - 0.036).abs() < 0.004, "medium {}", rate(medium));
        assert!((rate(phone) - 0.05).abs() < 0.004);
        assert!((rate(smoking) - 0.02).abs() < 0.003);
        assert!((rate(drinking) - 0.01).abs() < 0.002);
    }
}
