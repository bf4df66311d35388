//! Conversions between appraise native types and protobuf types.
//!
//! Shared by the server (proto → native for requests, native → proto for
//! responses) and the client (the reverse). Errors travel as gRPC status
//! codes; validation failures carry the JSON-encoded [`ValidationError`] in
//! the status details so the client can rebuild it exactly.

use std::collections::HashMap;
use std::path::PathBuf;

use tonic::metadata::MetadataValue;
use tonic::{Code, Status};

use crate::traits::ModelDescription;
use crate::{
    AppraiseError, ConfidenceBand, EmployeeRecord, FeatureKind, FeatureSchema, FeatureSpec,
    FeatureValue, Insight, InsightCategory, Prediction, PredictionResult, ValidationError,
};

use super::proto;

/// Metadata key carrying the model name on inference failures.
pub const MODEL_METADATA_KEY: &str = "x-appraise-model";

/// Metadata key carrying the offending field on validation failures.
pub const FIELD_METADATA_KEY: &str = "x-appraise-field";

// =============================================================================
// Records
// =============================================================================

impl From<proto::PredictRequest> for EmployeeRecord {
    fn from(p: proto::PredictRequest) -> Self {
        // A value with no variant set is treated as absent.
        p.record
            .into_iter()
            .filter_map(|(name, value)| {
                let value = match value.value? {
                    proto::feature_value::Value::Number(n) => FeatureValue::Number(n),
                    proto::feature_value::Value::Text(s) => FeatureValue::Text(s),
                    proto::feature_value::Value::Json(raw) => {
                        match serde_json::from_str::<serde_json::Value>(&raw) {
                            Ok(json) => FeatureValue::from(json),
                            Err(_) => FeatureValue::Other(serde_json::Value::String(raw)),
                        }
                    }
                };
                Some((name, value))
            })
            .collect()
    }
}

impl From<&EmployeeRecord> for proto::PredictRequest {
    fn from(record: &EmployeeRecord) -> Self {
        let record = record
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    FeatureValue::Number(n) => proto::feature_value::Value::Number(*n),
                    FeatureValue::Text(s) => proto::feature_value::Value::Text(s.clone()),
                    FeatureValue::Other(json) => proto::feature_value::Value::Json(json.to_string()),
                };
                (
                    name.to_string(),
                    proto::FeatureValue { value: Some(value) },
                )
            })
            .collect();
        proto::PredictRequest { record }
    }
}

// =============================================================================
// Predictions
// =============================================================================

impl From<InsightCategory> for proto::InsightCategory {
    fn from(category: InsightCategory) -> Self {
        match category {
            InsightCategory::NeedsDevelopment => proto::InsightCategory::NeedsDevelopment,
            InsightCategory::ConsistentPerformer => proto::InsightCategory::ConsistentPerformer,
            InsightCategory::HighPerformer => proto::InsightCategory::HighPerformer,
        }
    }
}

impl From<ConfidenceBand> for proto::ConfidenceBand {
    fn from(band: ConfidenceBand) -> Self {
        match band {
            ConfidenceBand::Low => proto::ConfidenceBand::Low,
            ConfidenceBand::Moderate => proto::ConfidenceBand::Moderate,
            ConfidenceBand::High => proto::ConfidenceBand::High,
        }
    }
}

impl From<Prediction> for proto::PredictResponse {
    fn from(prediction: Prediction) -> Self {
        let Prediction { result, insight } = prediction;
        proto::PredictResponse {
            label: result.label(),
            probabilities: probabilities_of(&result),
            confidence: result.confidence(),
            insight: Some(proto::Insight {
                category: proto::InsightCategory::from(insight.category) as i32,
                band: proto::ConfidenceBand::from(insight.band) as i32,
                headline: insight.headline,
                guidance: insight.guidance,
            }),
        }
    }
}

impl TryFrom<proto::PredictResponse> for Prediction {
    type Error = AppraiseError;

    fn try_from(p: proto::PredictResponse) -> Result<Self, Self::Error> {
        let result = if p.probabilities.is_empty() {
            PredictionResult::from_label(p.label)
        } else {
            PredictionResult::from_distribution(p.label, p.probabilities.into_iter().collect())
        };

        let insight = p
            .insight
            .ok_or_else(|| AppraiseError::Transport("response has no insight".to_string()))?;
        let category = match proto::InsightCategory::try_from(insight.category) {
            Ok(proto::InsightCategory::NeedsDevelopment) => InsightCategory::NeedsDevelopment,
            Ok(proto::InsightCategory::ConsistentPerformer) => InsightCategory::ConsistentPerformer,
            Ok(proto::InsightCategory::HighPerformer) => InsightCategory::HighPerformer,
            _ => {
                return Err(AppraiseError::Transport(format!(
                    "unknown insight category {}",
                    insight.category
                )));
            }
        };
        let band = match proto::ConfidenceBand::try_from(insight.band) {
            Ok(proto::ConfidenceBand::Low) => ConfidenceBand::Low,
            Ok(proto::ConfidenceBand::Moderate) => ConfidenceBand::Moderate,
            Ok(proto::ConfidenceBand::High) => ConfidenceBand::High,
            _ => {
                return Err(AppraiseError::Transport(format!(
                    "unknown confidence band {}",
                    insight.band
                )));
            }
        };

        Ok(Prediction {
            result,
            insight: Insight {
                category,
                band,
                headline: insight.headline,
                guidance: insight.guidance,
            },
        })
    }
}

// =============================================================================
// Schema
// =============================================================================

impl From<&FeatureSpec> for proto::FeatureSpec {
    fn from(spec: &FeatureSpec) -> Self {
        let kind = match &spec.kind {
            FeatureKind::Numeric { min, max, integer } => {
                proto::feature_spec::Kind::Numeric(proto::NumericDomain {
                    min: *min,
                    max: *max,
                    integer: *integer,
                })
            }
            FeatureKind::Categorical { categories } => {
                proto::feature_spec::Kind::Categorical(proto::CategoricalDomain {
                    categories: categories.clone(),
                })
            }
        };
        proto::FeatureSpec {
            name: spec.name.clone(),
            kind: Some(kind),
        }
    }
}

impl From<ModelDescription> for proto::SchemaResponse {
    fn from(description: ModelDescription) -> Self {
        proto::SchemaResponse {
            model: description.model,
            classes: description.classes,
            features: description.features.features().iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<proto::SchemaResponse> for ModelDescription {
    type Error = AppraiseError;

    fn try_from(p: proto::SchemaResponse) -> Result<Self, Self::Error> {
        let specs = p
            .features
            .into_iter()
            .map(|f| {
                let kind = match f.kind {
                    Some(proto::feature_spec::Kind::Numeric(d)) => FeatureKind::Numeric {
                        min: d.min,
                        max: d.max,
                        integer: d.integer,
                    },
                    Some(proto::feature_spec::Kind::Categorical(d)) => FeatureKind::Categorical {
                        categories: d.categories,
                    },
                    None => {
                        return Err(AppraiseError::Transport(format!(
                            "feature '{}' has no domain",
                            f.name
                        )));
                    }
                };
                Ok(FeatureSpec { name: f.name, kind })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ModelDescription {
            model: p.model,
            classes: p.classes,
            features: FeatureSchema::new(specs)?,
        })
    }
}

// =============================================================================
// Errors
// =============================================================================

impl From<AppraiseError> for Status {
    fn from(err: AppraiseError) -> Self {
        match err {
            AppraiseError::Validation(v) => {
                let details = serde_json::to_vec(&v).unwrap_or_default();
                let mut status =
                    Status::with_details(Code::InvalidArgument, v.to_string(), details.into());
                if let Ok(value) = MetadataValue::try_from(v.field.as_str()) {
                    status.metadata_mut().insert(FIELD_METADATA_KEY, value);
                }
                status
            }
            AppraiseError::Inference { model, source } => {
                let mut status = Status::internal(source.to_string());
                if let Ok(value) = MetadataValue::try_from(model.as_str()) {
                    status.metadata_mut().insert(MODEL_METADATA_KEY, value);
                }
                status
            }
            AppraiseError::ModelNotFound(_) => Status::not_found(err.to_string()),
            AppraiseError::ModelLoad { .. }
            | AppraiseError::InvalidSchema(_)
            | AppraiseError::Configuration(_) => Status::failed_precondition(err.to_string()),
            AppraiseError::NotImplemented(_) => Status::unimplemented(err.to_string()),
            AppraiseError::Json(_) => Status::invalid_argument(err.to_string()),
            AppraiseError::Http(_) | AppraiseError::Transport(_) => {
                Status::unavailable(err.to_string())
            }
        }
    }
}

/// Convert a [`Status`] received by the client back to an [`AppraiseError`].
pub fn from_status(status: Status) -> AppraiseError {
    match status.code() {
        Code::InvalidArgument => match serde_json::from_slice::<ValidationError>(status.details()) {
            Ok(v) => AppraiseError::Validation(v),
            Err(_) => AppraiseError::Transport(status.message().to_string()),
        },
        Code::Internal => {
            let model = status
                .metadata()
                .get(MODEL_METADATA_KEY)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("remote")
                .to_string();
            AppraiseError::inference(model, status.message().to_string())
        }
        Code::NotFound => AppraiseError::ModelNotFound(PathBuf::from(status.message())),
        Code::FailedPrecondition => AppraiseError::Configuration(status.message().to_string()),
        _ => AppraiseError::Transport(status.message().to_string()),
    }
}

/// Probability map as carried on the wire.
pub(crate) fn probabilities_of(result: &PredictionResult) -> HashMap<i64, f64> {
    result
        .probabilities()
        .map(|p| p.iter().map(|(k, v)| (*k, *v)).collect())
        .unwrap_or_default()
}
