//! Builder for configuring predictor instances

use std::path::PathBuf;
use std::sync::Arc;

use super::EmbeddedPredictor;
use crate::cache::{CacheConfig, PredictionCache};
use crate::model::{Classifier, ModelHandle, ModelManager};
use crate::types::FeatureSchema;
use crate::{AppraiseError, Result};

/// Main entry point for creating predictor instances.
pub struct Appraise;

impl Appraise {
    /// Create a new builder for configuring the predictor.
    pub fn builder() -> AppraiseBuilder {
        AppraiseBuilder::new()
    }
}

/// Builder for configuring predictor instances.
///
/// Exactly one model must be supplied, either as an artifact path (loaded
/// through a [`ModelManager`]) or as an already loaded handle.
///
/// ```rust,no_run
/// use appraise::{Appraise, CacheConfig};
///
/// let predictor = Appraise::builder()
///     .model_path("models/employee_performance.json")
///     .prediction_cache(CacheConfig::default())
///     .build()?;
/// # Ok::<(), appraise::AppraiseError>(())
/// ```
pub struct AppraiseBuilder {
    model_path: Option<PathBuf>,
    handle: Option<ModelHandle>,
    manager: Option<Arc<ModelManager>>,
    cache: Option<CacheConfig>,
}

impl AppraiseBuilder {
    pub fn new() -> Self {
        Self {
            model_path: None,
            handle: None,
            manager: None,
            cache: None,
        }
    }

    /// Load the model artifact at `path` when building.
    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Use an already loaded model.
    pub fn handle(mut self, handle: ModelHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Use a custom classifier bound to `schema`.
    pub fn classifier(self, schema: FeatureSchema, classifier: impl Classifier + 'static) -> Self {
        self.handle(ModelHandle::new(schema, classifier))
    }

    /// Share a model manager, so several predictors reuse loaded models.
    pub fn manager(mut self, manager: Arc<ModelManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Enable the prediction cache.
    pub fn prediction_cache(mut self, config: CacheConfig) -> Self {
        self.cache = Some(config);
        self
    }

    pub fn build(self) -> Result<EmbeddedPredictor> {
        let handle = match (self.handle, self.model_path) {
            (Some(_), Some(_)) => {
                return Err(AppraiseError::Configuration(
                    "both a model handle and a model path were supplied".to_string(),
                ));
            }
            (Some(handle), None) => handle,
            (None, Some(path)) => {
                let manager = self
                    .manager
                    .unwrap_or_else(|| Arc::new(ModelManager::with_defaults()));
                manager.load(&path)?
            }
            (None, None) => {
                return Err(AppraiseError::Configuration(
                    "no model configured".to_string(),
                ));
            }
        };

        let cache = self.cache.as_ref().map(PredictionCache::new);
        Ok(EmbeddedPredictor::new(handle, cache))
    }
}

impl Default for AppraiseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
