//! Public types for the Appraise API.

mod insight;
mod prediction;
mod schema;
mod value;

pub use insight::{ConfidenceBand, Insight, InsightCategory, interpret};
pub use prediction::{
    ClassDistribution, Label, PROBABILITY_TOLERANCE, Prediction, PredictionResult,
};
pub use schema::{FeatureKind, FeatureSchema, FeatureSpec};
pub use value::{EmployeeRecord, FeatureValue};
