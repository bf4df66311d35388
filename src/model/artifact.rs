//! JSON model artifact format and loader.
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "name": "employee-performance",
//!   "classes": [2, 3, 4],
//!   "features": [
//!     {"name": "Age", "kind": "numeric", "min": 18, "max": 60, "integer": true,
//!      "mean": 36.9, "scale": 9.1},
//!     {"name": "Gender", "kind": "categorical", "categories": ["Male", "Female"]}
//!   ],
//!   "estimator": {"type": "linear", "intercepts": [..], "coefficients": [[..], ..]}
//! }
//! ```
//!
//! Tree estimators use `{"type": "tree", "nodes": [..]}` where each node is
//! either `{"feature": 3, "threshold": 0.5, "left": 1, "right": 2}` or
//! `{"class": 3}`. Split features index the encoded vector.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::{FeatureKind, FeatureSchema, FeatureSpec, Label};
use crate::{AppraiseError, Result, telemetry};

use super::{Classifier, ModelHandle};
use super::pipeline::{Encoder, Estimator, Pipeline, TreeNode};

/// Highest artifact format version this build understands.
pub const MAX_SUPPORTED_FORMAT: u32 = 1;

/// Serialized pipeline, as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub name: String,
    pub classes: Vec<Label>,
    pub features: Vec<ArtifactFeature>,
    pub estimator: ArtifactEstimator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactFeature {
    pub name: String,
    #[serde(flatten)]
    pub encoding: ArtifactEncoding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactEncoding {
    Numeric {
        min: f64,
        max: f64,
        #[serde(default)]
        integer: bool,
        #[serde(default)]
        mean: f64,
        #[serde(default = "unit_scale")]
        scale: f64,
    },
    Categorical {
        categories: Vec<String>,
    },
}

fn unit_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactEstimator {
    Linear {
        intercepts: Vec<f64>,
        coefficients: Vec<Vec<f64>>,
    },
    Tree {
        nodes: Vec<ArtifactNode>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: Label,
    },
}

impl ModelArtifact {
    /// Parse an artifact from JSON text.
    pub fn from_json(json: &str) -> std::result::Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("malformed artifact: {e}"))
    }

    /// Check the artifact and build the pipeline it describes.
    pub fn into_pipeline(self) -> std::result::Result<Pipeline, String> {
        if self.format_version == 0 || self.format_version > MAX_SUPPORTED_FORMAT {
            return Err(format!(
                "unsupported format version {} (max supported: {MAX_SUPPORTED_FORMAT})",
                self.format_version
            ));
        }

        let mut specs = Vec::with_capacity(self.features.len());
        let mut encoders = Vec::with_capacity(self.features.len());
        for feature in self.features {
            match feature.encoding {
                ArtifactEncoding::Numeric {
                    min,
                    max,
                    integer,
                    mean,
                    scale,
                } => {
                    specs.push(FeatureSpec {
                        name: feature.name,
                        kind: FeatureKind::Numeric { min, max, integer },
                    });
                    encoders.push(Encoder::Standardize { mean, scale });
                }
                ArtifactEncoding::Categorical { categories } => {
                    encoders.push(Encoder::OneHot {
                        categories: categories.clone(),
                    });
                    specs.push(FeatureSpec {
                        name: feature.name,
                        kind: FeatureKind::Categorical { categories },
                    });
                }
            }
        }
        let schema = FeatureSchema::new(specs).map_err(|e| e.to_string())?;

        let estimator = match self.estimator {
            ArtifactEstimator::Linear {
                intercepts,
                coefficients,
            } => Estimator::Linear {
                intercepts,
                coefficients,
            },
            ArtifactEstimator::Tree { nodes } => Estimator::Tree {
                nodes: nodes
                    .into_iter()
                    .map(|node| match node {
                        ArtifactNode::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        } => TreeNode::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        },
                        ArtifactNode::Leaf { class } => TreeNode::Leaf { class },
                    })
                    .collect(),
            },
        };

        Pipeline::new(self.name, self.classes, schema, encoders, estimator)
    }
}

/// Open and deserialize the artifact at `path`.
///
/// Fails with [`AppraiseError::ModelNotFound`] when nothing exists at the
/// path and [`AppraiseError::ModelLoad`] for anything that cannot be turned
/// into a working pipeline. Does no caching; see
/// [`ModelManager`](super::ModelManager) for load-once semantics.
pub fn load_model(path: &Path) -> Result<ModelHandle> {
    let start = Instant::now();
    let result = read_pipeline(path);

    let status = if result.is_ok() { "ok" } else { "error" };
    metrics::counter!(telemetry::MODEL_LOADS_TOTAL, "status" => status).increment(1);

    match result {
        Ok(pipeline) => {
            metrics::histogram!(telemetry::MODEL_LOAD_DURATION_SECONDS)
                .record(start.elapsed().as_secs_f64());
            info!(
                path = %path.display(),
                model = pipeline.name(),
                features = pipeline.schema().len(),
                classes = ?pipeline.classes(),
                "model loaded"
            );
            let schema = pipeline.schema().clone();
            Ok(ModelHandle::from_arc(schema, std::sync::Arc::new(pipeline)))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "model load failed");
            Err(e)
        }
    }
}

fn read_pipeline(path: &Path) -> Result<Pipeline> {
    if !path.exists() {
        return Err(AppraiseError::ModelNotFound(path.to_path_buf()));
    }
    let load_error = |reason: String| AppraiseError::ModelLoad {
        path: path.to_path_buf(),
        reason,
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| load_error(format!("failed to read file: {e}")))?;
    ModelArtifact::from_json(&content)
        .and_then(ModelArtifact::into_pipeline)
        .map_err(load_error)
}
