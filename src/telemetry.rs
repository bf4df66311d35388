//! Telemetry metric name constants.
//!
//! Centralised metric names for appraise operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `appraise_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `model`: model name reported by the classifier
//! - `status`: outcome: "ok" or "error"
//! - `reason`: validation failure code (e.g. "missing", "out_of_range")

/// Total classifier invocations.
///
/// Labels: `model`, `status` ("ok" | "error").
pub const PREDICTIONS_TOTAL: &str = "appraise_predictions_total";

/// Classifier invocation duration in seconds.
///
/// Labels: `model`.
pub const INFERENCE_DURATION_SECONDS: &str = "appraise_inference_duration_seconds";

/// Total records rejected by the feature contract.
///
/// Labels: `model`, `reason`.
pub const VALIDATION_FAILURES_TOTAL: &str = "appraise_validation_failures_total";

/// Total artifact load attempts.
///
/// Labels: `status` ("ok" | "error").
pub const MODEL_LOADS_TOTAL: &str = "appraise_model_loads_total";

/// Artifact deserialization time in seconds (successful loads only).
pub const MODEL_LOAD_DURATION_SECONDS: &str = "appraise_model_load_duration_seconds";

/// Total prediction cache hits.
///
/// Labels: `model`.
pub const CACHE_HITS_TOTAL: &str = "appraise_cache_hits_total";

/// Total prediction cache misses.
///
/// Labels: `model`.
pub const CACHE_MISSES_TOTAL: &str = "appraise_cache_misses_total";
