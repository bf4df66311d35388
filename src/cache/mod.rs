//! Caching subsystem.
//!
//! - [`PredictionCache`]: opt-in LRU + TTL cache of results for validated
//!   records. Activated via the builder's `.prediction_cache()` method.
//!
//! Loaded models are cached separately by
//! [`ModelManager`](crate::model::ModelManager).

pub mod prediction;

pub use prediction::{CacheConfig, PredictionCache};
