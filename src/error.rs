//! Appraise error types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::contract::ValidationError;

/// Boxed error carried as the cause of an inference failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Appraise error types
#[derive(Debug, thiserror::Error)]
pub enum AppraiseError {
    // Startup errors
    #[error("model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("failed to load model from {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("invalid feature schema: {0}")]
    InvalidSchema(String),

    // Per-request errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The classifier failed on a validated record. The original fault is
    /// kept as the error source.
    #[error("inference failed for model '{model}': {source}")]
    Inference {
        model: String,
        #[source]
        source: BoxError,
    },

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("operation not implemented: {0}")]
    NotImplemented(&'static str),

    // Network/transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// A request payload that is not a well-formed JSON record.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppraiseError {
    /// Whether the error only affects the request that raised it.
    ///
    /// Malformed payloads, validation and inference failures reject a single
    /// request; everything else means the service itself is unusable until
    /// fixed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Json(_) | Self::Validation(_) | Self::Inference { .. }
        )
    }

    /// Build an inference error from any cause.
    pub fn inference(model: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::Inference {
            model: model.into(),
            source: cause.into(),
        }
    }

    /// Machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelNotFound(_) => ErrorKind::ModelNotFound,
            Self::ModelLoad { .. } | Self::InvalidSchema(_) => ErrorKind::ModelLoad,
            Self::Validation(_) | Self::Json(_) => ErrorKind::Validation,
            Self::Inference { .. } => ErrorKind::Inference,
            Self::Configuration(_) | Self::NotImplemented(_) => ErrorKind::Configuration,
            Self::Http(_) | Self::Transport(_) => ErrorKind::Unavailable,
        }
    }
}

/// Error category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ModelNotFound,
    ModelLoad,
    Validation,
    Inference,
    Configuration,
    Unavailable,
}

/// Well-formed error object handed to callers instead of a raw fault.
///
/// ```json
/// {"error": "validation", "field": "EmpDepartment", "message": "..."}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<&AppraiseError> for ErrorResponse {
    fn from(err: &AppraiseError) -> Self {
        let field = match err {
            AppraiseError::Validation(v) => Some(v.field.clone()),
            _ => None,
        };
        Self {
            error: err.kind(),
            message: err.to_string(),
            field,
        }
    }
}

/// Result type alias for Appraise operations
pub type Result<T> = std::result::Result<T, AppraiseError>;
