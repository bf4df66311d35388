//! The opaque classification capability and the handle that owns it.

use std::fmt;
use std::sync::Arc;

use crate::contract::ValidatedRecord;
use crate::error::BoxError;
use crate::types::{ClassDistribution, FeatureSchema, Label};
use crate::AppraiseError;

/// A loaded, pre-trained classifier.
///
/// Implementations are read-only after construction and must be safe to
/// call from many threads at once. Errors are returned as-is; the adapter
/// wraps them into [`AppraiseError::Inference`].
pub trait Classifier: Send + Sync {
    /// Model name for logging and cache keys.
    fn name(&self) -> &str;

    /// Every label this classifier can produce.
    fn classes(&self) -> &[Label];

    /// Predict a label.
    fn classify(&self, record: &ValidatedRecord) -> Result<Label, BoxError>;

    /// Whether [`classify_with_confidence`](Self::classify_with_confidence)
    /// is available.
    fn exposes_probabilities(&self) -> bool {
        false
    }

    /// Predict a label along with the full class distribution.
    fn classify_with_confidence(
        &self,
        _record: &ValidatedRecord,
    ) -> Result<(Label, ClassDistribution), BoxError> {
        Err(Box::new(AppraiseError::NotImplemented(
            "classify_with_confidence",
        )))
    }
}

/// A loaded model bound to its feature schema.
///
/// Cloning is cheap; clones share the same classifier and schema.
#[derive(Clone)]
pub struct ModelHandle {
    id: String,
    schema: Arc<FeatureSchema>,
    classifier: Arc<dyn Classifier>,
}

impl ModelHandle {
    pub fn new(schema: FeatureSchema, classifier: impl Classifier + 'static) -> Self {
        Self::from_arc(Arc::new(schema), Arc::new(classifier))
    }

    pub fn from_arc(schema: Arc<FeatureSchema>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            id: classifier.name().to_string(),
            schema,
            classifier,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn classes(&self) -> &[Label] {
        self.classifier.classes()
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Whether two handles share the same underlying model instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.classifier, &other.classifier)
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("id", &self.id)
            .field("features", &self.schema.len())
            .field("classes", &self.classes())
            .finish()
    }
}
