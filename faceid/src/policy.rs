use std::fmt;

use serde::{Deserialize, Serialize};

use crate::FaceIdError;

/// Confidence band a distance falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// `distance < strong_distance`.
    Strong,
    /// `strong_distance <= distance < weak_distance`.
    Weak,
    /// Everything else, including NaN.
    Low,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strong => write!(f, "strong"),
            Self::Weak => write!(f, "weak"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Maps squared L2 distances to a confidence score with a three-tier step
/// function, and decides which scores count as a recognition.
///
/// Lower tier bounds are inclusive: a distance exactly at
/// `strong_distance` is [`Tier::Weak`], exactly at `weak_distance` is
/// [`Tier::Low`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePolicy {
    /// Upper bound (exclusive) of the strong tier (default: 0.6).
    pub strong_distance: f32,
    /// Upper bound (exclusive) of the weak tier (default: 1.0).
    pub weak_distance: f32,
    /// Score of the strong tier (default: 1.0).
    pub strong_confidence: f32,
    /// Score of the weak tier (default: 0.95).
    pub weak_confidence: f32,
    /// Score of the low tier (default: 0.5).
    pub low_confidence: f32,
    /// Minimum score reported as a recognition (default: 0.8).
    pub accept: f32,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            strong_distance: 0.6,
            weak_distance: 1.0,
            strong_confidence: 1.0,
            weak_confidence: 0.95,
            low_confidence: 0.5,
            accept: 0.8,
        }
    }
}

impl ConfidencePolicy {
    /// Checks that the policy is finite, ordered and monotonic: a smaller
    /// distance never scores lower than a larger one.
    pub fn validate(&self) -> Result<(), FaceIdError> {
        let fields = [
            ("strong_distance", self.strong_distance),
            ("weak_distance", self.weak_distance),
            ("strong_confidence", self.strong_confidence),
            ("weak_confidence", self.weak_confidence),
            ("low_confidence", self.low_confidence),
            ("accept", self.accept),
        ];
        for (name, v) in fields {
            if !v.is_finite() {
                return Err(FaceIdError::InvalidPolicy(format!("{name} is not finite")));
            }
        }

        if self.strong_distance < 0.0 || self.strong_distance > self.weak_distance {
            return Err(FaceIdError::InvalidPolicy(format!(
                "distances must satisfy 0 <= strong ({}) <= weak ({})",
                self.strong_distance, self.weak_distance
            )));
        }

        for (name, v) in &fields[2..] {
            if !(0.0..=1.0).contains(v) {
                return Err(FaceIdError::InvalidPolicy(format!(
                    "{name} = {v} is outside [0, 1]"
                )));
            }
        }

        if self.strong_confidence < self.weak_confidence
            || self.weak_confidence < self.low_confidence
        {
            return Err(FaceIdError::InvalidPolicy(
                "confidences must not increase with distance".into(),
            ));
        }
        Ok(())
    }

    /// Returns the tier of a distance.
    pub fn tier(&self, distance: f32) -> Tier {
        if distance < self.strong_distance {
            Tier::Strong
        } else if distance < self.weak_distance {
            Tier::Weak
        } else {
            Tier::Low
        }
    }

    /// Returns the confidence score of a distance.
    pub fn confidence(&self, distance: f32) -> f32 {
        match self.tier(distance) {
            Tier::Strong => self.strong_confidence,
            Tier::Weak => self.weak_confidence,
            Tier::Low => self.low_confidence,
        }
    }

    /// Reports whether a confidence clears the acceptance bar.
    pub fn accepts(&self, confidence: f32) -> bool {
        confidence >= self.accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tiers() {
        let p = ConfidencePolicy::default();
        assert_eq!(p.confidence(0.0), 1.0);
        assert_eq!(p.confidence(0.59), 1.0);
        assert_eq!(p.confidence(0.75), 0.95);
        assert_eq!(p.confidence(1.5), 0.5);
        assert_eq!(p.confidence(f32::MAX), 0.5);
    }

    #[test]
    fn boundaries_belong_to_the_lower_tier() {
        let p = ConfidencePolicy::default();
        assert_eq!(p.tier(0.6), Tier::Weak);
        assert_eq!(p.confidence(0.6), 0.95);
        assert_eq!(p.tier(1.0), Tier::Low);
        assert_eq!(p.confidence(1.0), 0.5);
    }

    #[test]
    fn nan_is_low() {
        let p = ConfidencePolicy::default();
        assert_eq!(p.tier(f32::NAN), Tier::Low);
        assert!(!p.accepts(p.confidence(f32::NAN)));
    }

    #[test]
    fn confidence_is_monotonic() {
        let p = ConfidencePolicy::default();
        let distances: Vec<f32> = (0..=400).map(|i| i as f32 * 0.005).collect();
        for pair in distances.windows(2) {
            assert!(
                p.confidence(pair[0]) >= p.confidence(pair[1]),
                "confidence({}) < confidence({})",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn acceptance_bar() {
        let p = ConfidencePolicy::default();
        assert!(p.accepts(1.0));
        assert!(p.accepts(0.95));
        assert!(p.accepts(0.8));
        assert!(!p.accepts(0.5));
    }

    #[test]
    fn validate_default() {
        assert!(ConfidencePolicy::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_policies() {
        let swapped = ConfidencePolicy {
            strong_distance: 1.2,
            ..Default::default()
        };
        assert!(swapped.validate().is_err());

        let inverted = ConfidencePolicy {
            weak_confidence: 1.0,
            strong_confidence: 0.9,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let out_of_range = ConfidencePolicy {
            accept: 1.5,
            ..Default::default()
        };
        assert!(out_of_range.validate().is_err());

        let nan = ConfidencePolicy {
            weak_distance: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(nan.validate(), Err(FaceIdError::InvalidPolicy(_))));
    }

    #[test]
    fn custom_thresholds() {
        let p = ConfidencePolicy {
            strong_distance: 0.3,
            weak_distance: 0.5,
            ..Default::default()
        };
        assert_eq!(p.confidence(0.4), 0.95);
        assert_eq!(p.confidence(0.6), 0.5);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let p: ConfidencePolicy = serde_yaml::from_str("accept: 0.9\n").unwrap();
        assert_eq!(p.accept, 0.9);
        assert_eq!(p.strong_distance, 0.6);
        assert_eq!(p.low_confidence, 0.5);
    }

    #[test]
    fn tier_display() {
        assert_eq!(Tier::Strong.to_string(), "strong");
        assert_eq!(Tier::Weak.to_string(), "weak");
        assert_eq!(Tier::Low.to_string(), "low");
    }
}
