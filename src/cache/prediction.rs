//! Opt-in prediction cache.
//!
//! Classification is a deterministic function of the model and the
//! validated record, so a result can be served again for an identical
//! record without touching the classifier. The cache sits in
//! [`EmbeddedPredictor`](crate::gateway::EmbeddedPredictor) after
//! validation; invalid records never reach it.
//!
//! Keys are a content hash of (model id, feature names, feature values).
//! Numeric values are hashed by bit pattern, so `0.0` and `-0.0` are
//! distinct keys.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use moka::sync::Cache;

use crate::contract::{ValidatedRecord, ValidatedValue};
use crate::telemetry;
use crate::types::PredictionResult;

/// Configuration for the prediction cache.
///
/// Pass to [`AppraiseBuilder::prediction_cache()`](crate::AppraiseBuilder::prediction_cache)
/// to activate. Without this, no cache is allocated.
///
/// ```rust
/// # use appraise::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(10_000)
///     .ttl(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 10,000.
    pub max_entries: u64,
    /// Time-to-live for cached entries. Default: 1 hour.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// In-memory LRU + TTL cache of prediction results.
pub struct PredictionCache {
    cache: Cache<u64, PredictionResult>,
}

impl PredictionCache {
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { cache }
    }

    /// Look up a cached result.
    ///
    /// Returns `None` on cache miss. Emits cache hit/miss metrics.
    pub fn get(&self, model: &str, record: &ValidatedRecord) -> Option<PredictionResult> {
        let key = cache_key(model, record);
        match self.cache.get(&key) {
            Some(result) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "model" => model.to_string())
                    .increment(1);
                Some(result)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "model" => model.to_string())
                    .increment(1);
                None
            }
        }
    }

    pub fn insert(&self, model: &str, record: &ValidatedRecord, result: PredictionResult) {
        self.cache.insert(cache_key(model, record), result);
    }
}

fn cache_key(model: &str, record: &ValidatedRecord) -> u64 {
    let mut hasher = DefaultHasher::new();
    model.hash(&mut hasher);
    for (name, value) in record.iter() {
        name.hash(&mut hasher);
        match value {
            ValidatedValue::Numeric(n) => {
                0u8.hash(&mut hasher);
                n.to_bits().hash(&mut hasher);
            }
            ValidatedValue::Category(c) => {
                1u8.hash(&mut hasher);
                c.hash(&mut hasher);
            }
        }
    }
    hasher.finish()
}
