//! Appraise - feature contract and inference adapter for performance rating
//! models
//!
//! This crate sits between free-form form input and a pre-trained
//! classifier. It validates one employee record against the feature schema
//! the model declares, runs the model once, and returns a stable result
//! envelope (label, probabilities, confidence) with a fixed interpretation.
//! Callers always get either a [`Prediction`] or an [`AppraiseError`], never
//! a raw model fault.
//!
//! # Example
//!
//! ```rust,no_run
//! use appraise::{Appraise, EmployeeRecord};
//!
//! fn main() -> appraise::Result<()> {
//!     let predictor = Appraise::builder()
//!         .model_path("models/employee_performance.json")
//!         .build()?;
//!
//!     let record = EmployeeRecord::new()
//!         .with("Age", 30)
//!         .with("Gender", "Male")
//!         .with("EmpDepartment", "Sales")
//!         .with("EmpEnvironmentSatisfaction", 3)
//!         .with("EmpLastSalaryHikePercent", 15)
//!         .with("EmpWorkLifeBalance", 3)
//!         .with("YearsSinceLastPromotion", 2)
//!         .with("EmpJobSatisfaction", 3)
//!         .with("EmpJobInvolvement", 3);
//!
//!     let prediction = predictor.predict_record(&record)?;
//!     println!("{} ({})", prediction.result.label(), prediction.insight.headline);
//!     Ok(())
//! }
//! ```
//!
//! # Custom models
//!
//! Any model format can be served by implementing [`Classifier`] and passing
//! it to [`AppraiseBuilder::classifier`].

pub mod cache;
#[cfg(feature = "client")]
pub mod client;
pub mod contract;
pub mod error;
pub mod gateway;
pub mod inference;
pub mod model;
#[cfg(any(feature = "server", feature = "client"))]
pub mod server;
pub mod telemetry;
pub mod traits;
pub mod types;
mod version;

// Re-export main types at crate root
pub use cache::{CacheConfig, PredictionCache};
pub use contract::{ValidatedRecord, ValidatedValue, ValidationError, ValidationReason, validate};
pub use error::{AppraiseError, BoxError, ErrorKind, ErrorResponse, Result};
pub use gateway::{Appraise, AppraiseBuilder, EmbeddedPredictor};
pub use inference::predict;
pub use model::{
    Classifier, LoadedModel, ModelHandle, ModelManager, ModelManagerConfig, ModelSource,
    load_model,
};
pub use traits::{ModelDescription, Predictor};
pub use version::{GIT_BRANCH, GIT_SHA, PKG_VERSION, git_dirty, version_string};

// Re-export all types
pub use types::{
    ClassDistribution, ConfidenceBand, EmployeeRecord, FeatureKind, FeatureSchema, FeatureSpec,
    FeatureValue, Insight, InsightCategory, Label, Prediction, PredictionResult, interpret,
};
