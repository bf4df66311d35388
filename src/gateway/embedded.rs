//! EmbeddedPredictor - runs the adapter in-process

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::cache::PredictionCache;
use crate::contract::{ValidatedRecord, validate};
use crate::inference;
use crate::model::ModelHandle;
use crate::traits::ModelDescription;
use crate::types::{EmployeeRecord, Prediction, PredictionResult, interpret};
use crate::{AppraiseError, Predictor, Result, telemetry};

/// Predictor bound to one loaded model, running in the caller's process.
pub struct EmbeddedPredictor {
    handle: ModelHandle,
    cache: Option<PredictionCache>,
}

impl EmbeddedPredictor {
    pub(crate) fn new(handle: ModelHandle, cache: Option<PredictionCache>) -> Self {
        Self { handle, cache }
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    /// Check a record against the bound schema.
    pub fn validate(&self, record: &EmployeeRecord) -> Result<ValidatedRecord> {
        validate(record, self.handle.schema()).map_err(|e| {
            metrics::counter!(
                telemetry::VALIDATION_FAILURES_TOTAL,
                "model" => self.handle.id().to_string(),
                "reason" => e.reason_code()
            )
            .increment(1);
            debug!(field = %e.field, reason = %e.reason, "record rejected");
            AppraiseError::from(e)
        })
    }

    /// Classify an already validated record, consulting the cache first.
    pub fn classify(&self, record: &ValidatedRecord) -> Result<PredictionResult> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(self.handle.id(), record) {
                return Ok(hit);
            }
        }
        let result = inference::predict(&self.handle, record)?;
        if let Some(cache) = &self.cache {
            cache.insert(self.handle.id(), record, result.clone());
        }
        Ok(result)
    }

    /// Validate, classify and interpret one record (synchronous).
    #[instrument(skip(self, record), fields(model = self.handle.id()))]
    pub fn predict_record(&self, record: &EmployeeRecord) -> Result<Prediction> {
        let validated = self.validate(record)?;
        let result = self.classify(&validated)?;
        let insight = interpret(&result);
        Ok(Prediction { result, insight })
    }

    /// Describe the bound model (synchronous).
    pub fn description(&self) -> ModelDescription {
        ModelDescription {
            model: self.handle.id().to_string(),
            classes: self.handle.classes().to_vec(),
            features: self.handle.schema().as_ref().clone(),
        }
    }

    /// Whether results are being cached.
    pub fn caches_predictions(&self) -> bool {
        self.cache.is_some()
    }
}

#[async_trait]
impl Predictor for EmbeddedPredictor {
    async fn describe(&self) -> Result<ModelDescription> {
        Ok(self.description())
    }

    async fn predict(&self, record: &EmployeeRecord) -> Result<Prediction> {
        self.predict_record(record)
    }
}
