//! Core Predictor trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{EmployeeRecord, FeatureSchema, Label, Prediction, Result};

/// What a predictor serves: the model name, its schema and its classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescription {
    pub model: String,
    pub classes: Vec<Label>,
    pub features: FeatureSchema,
}

/// The prediction facade that all front ends talk to.
///
/// Implemented in-process by [`EmbeddedPredictor`](crate::EmbeddedPredictor)
/// and, with the `client` feature, over gRPC by `ServiceClient`. Callers get
/// either a complete [`Prediction`] or an [`AppraiseError`](crate::AppraiseError)
/// they can turn into an [`ErrorResponse`](crate::ErrorResponse).
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Describe the bound model.
    async fn describe(&self) -> Result<ModelDescription>;

    /// Validate, classify and interpret one record.
    async fn predict(&self, record: &EmployeeRecord) -> Result<Prediction>;
}
