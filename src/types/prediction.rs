//! Prediction result envelope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Insight;

/// Ordinal performance rating class (e.g. 2, 3 or 4).
pub type Label = i64;

/// Class label → probability.
pub type ClassDistribution = BTreeMap<Label, f64>;

/// Tolerance when checking that a distribution sums to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Outcome of one classification.
///
/// Serializes as `{"label": 3, "probabilities": {"2": 0.1, ...}, "confidence": 0.7}`;
/// `probabilities` is omitted when the model does not expose them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    label: Label,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    probabilities: Option<ClassDistribution>,
    confidence: f64,
}

impl PredictionResult {
    /// Result from a model that only reports a label. Confidence is 1.0.
    pub fn from_label(label: Label) -> Self {
        Self {
            label,
            probabilities: None,
            confidence: 1.0,
        }
    }

    /// Result from a model that reports a class distribution.
    ///
    /// Confidence is the largest probability in the distribution.
    pub fn from_distribution(label: Label, probabilities: ClassDistribution) -> Self {
        let confidence = probabilities.values().copied().fold(0.0_f64, f64::max);
        Self {
            label,
            probabilities: Some(probabilities),
            confidence,
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn probabilities(&self) -> Option<&ClassDistribution> {
        self.probabilities.as_ref()
    }

    /// Probability of one class, if the model exposed a distribution.
    pub fn probability(&self, label: Label) -> Option<f64> {
        self.probabilities
            .as_ref()
            .map(|p| p.get(&label).copied().unwrap_or(0.0))
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// A prediction together with its interpretation.
///
/// Serializes flattened: `{"label": .., "probabilities": .., "confidence": .., "insight": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(flatten)]
    pub result: PredictionResult,
    pub insight: Insight,
}
