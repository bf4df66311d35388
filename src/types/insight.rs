//! Textual interpretation of a predicted rating.
//!
//! Labels partition into three categories (`<= 2`, `3`, `>= 4`) and
//! confidence into three bands (`< 0.5`, `< 0.75`, the rest). Both
//! partitions cover their whole domain, so every result has exactly one
//! interpretation.

use serde::{Deserialize, Serialize};

use super::{Label, PredictionResult};

/// Performance category derived from the predicted label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    NeedsDevelopment,
    ConsistentPerformer,
    HighPerformer,
}

impl InsightCategory {
    pub fn from_label(label: Label) -> Self {
        match label {
            Label::MIN..=2 => Self::NeedsDevelopment,
            3 => Self::ConsistentPerformer,
            4..=Label::MAX => Self::HighPerformer,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Self::NeedsDevelopment => "Needs development support",
            Self::ConsistentPerformer => "Consistent performer",
            Self::HighPerformer => "High performer",
        }
    }

    pub fn guidance(&self) -> &'static str {
        match self {
            Self::NeedsDevelopment => {
                "Provide coaching, skill training, and close performance tracking."
            }
            Self::ConsistentPerformer => {
                "Solid performer. Offer targeted training and growth opportunities."
            }
            Self::HighPerformer => {
                "Consider for leadership, mentorship, or high-growth roles."
            }
        }
    }
}

/// How much weight the prediction deserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    Low,
    Moderate,
    High,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence < 0.5 {
            Self::Low
        } else if confidence < 0.75 {
            Self::Moderate
        } else {
            Self::High
        }
    }
}

/// Interpretation of a [`PredictionResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub band: ConfidenceBand,
    pub headline: String,
    pub guidance: String,
}

impl Insight {
    pub fn new(category: InsightCategory, band: ConfidenceBand) -> Self {
        Self {
            category,
            band,
            headline: category.headline().to_string(),
            guidance: category.guidance().to_string(),
        }
    }
}

/// Map a result to its fixed interpretation.
pub fn interpret(result: &PredictionResult) -> Insight {
    Insight::new(
        InsightCategory::from_label(result.label()),
        ConfidenceBand::from_confidence(result.confidence()),
    )
}
