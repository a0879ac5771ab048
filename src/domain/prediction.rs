//! Prediction result types.
//!
//! Represents the output of the heart-disease classifier for one patient.

use serde::{Deserialize, Serialize};

use super::features::FeatureVector;

/// Binary risk label produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Class 0: no heart disease predicted
    Low,
    /// Class 1: heart disease predicted
    High,
}

impl RiskLabel {
    /// Map a raw class label (0 or 1) to a risk label.
    #[must_use]
    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(Self::Low),
            1 => Some(Self::High),
            _ => None,
        }
    }

    #[must_use]
    pub fn class(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk Detected",
            Self::High => "High Risk Detected",
        }
    }

    /// Short status shown next to the label.
    #[must_use]
    pub fn delta(&self) -> &'static str {
        match self {
            Self::Low => "Normal",
            Self::High => "High Risk",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Label and confidence derived from one classifier invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: RiskLabel,

    /// Probability mass of the predicted class (0.0 to 1.0).
    /// `None` when the classifier cannot estimate probabilities.
    pub confidence: Option<f64>,
}

impl PredictionResult {
    /// Build a result from a label and the classifier's P(label = 1).
    #[must_use]
    pub fn with_probability(label: RiskLabel, positive_probability: f64) -> Self {
        let p = positive_probability.clamp(0.0, 1.0);
        let confidence = match label {
            RiskLabel::High => p,
            RiskLabel::Low => 1.0 - p,
        };
        Self {
            label,
            confidence: Some(confidence),
        }
    }

    /// Build a result for a classifier without probability estimation.
    #[must_use]
    pub fn label_only(label: RiskLabel) -> Self {
        Self {
            label,
            confidence: None,
        }
    }
}

/// Encoded input together with the classifier's verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub features: FeatureVector,
    pub result: PredictionResult,
    pub computed_at: chrono::DateTime<chrono::Utc>,
}

impl Prediction {
    #[must_use]
    pub fn new(features: FeatureVector, result: PredictionResult) -> Self {
        Self {
            features,
            result,
            computed_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_follows_predicted_class() {
        let high = PredictionResult::with_probability(RiskLabel::High, 0.8);
        assert_eq!(high.confidence, Some(0.8));

        let low = PredictionResult::with_probability(RiskLabel::Low, 0.25);
        let confidence = low.confidence.expect("confidence");
        assert!((confidence - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_label_only_has_no_confidence() {
        let result = PredictionResult::label_only(RiskLabel::High);
        assert_eq!(result.label, RiskLabel::High);
        assert!(result.confidence.is_none());
    }

    #[test]
    fn test_class_mapping() {
        assert_eq!(RiskLabel::from_class(0), Some(RiskLabel::Low));
        assert_eq!(RiskLabel::from_class(1), Some(RiskLabel::High));
        assert_eq!(RiskLabel::from_class(2), None);
        assert_eq!(RiskLabel::High.class(), 1);
        assert_eq!(RiskLabel::Low.to_string(), "LOW");
    }
}
