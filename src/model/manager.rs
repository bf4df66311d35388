//! Model manager for load-once model caching.
//!
//! Provides thread-safe lazy loading of model artifacts with double-checked
//! locking, so each artifact is deserialized at most once per manager even
//! when many callers ask for it at the same time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::{AppraiseError, Result};

use super::{ModelHandle, ModelSource, load_model};

/// Function that turns an artifact path into a loaded model.
pub type ModelLoader = Arc<dyn Fn(&Path) -> Result<ModelHandle> + Send + Sync>;

/// Configuration for the model manager.
#[derive(Debug, Clone)]
pub struct ModelManagerConfig {
    /// Cache directory for downloaded artifacts.
    pub cache_dir: PathBuf,
}

impl Default for ModelManagerConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::var("APPRAISE_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::cache_dir()
                        .unwrap_or_else(|| PathBuf::from(".cache"))
                        .join("appraise")
                        .join("models")
                }),
        }
    }
}

/// A model currently held by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModel {
    /// Model name reported by the classifier.
    pub id: String,
    /// Path the model was loaded from.
    pub path: PathBuf,
}

/// Model manager for lazy loading and caching of model artifacts.
///
/// Construct one per process and pass it (or the handles it returns) to
/// whoever needs a model. Handles are shared via `Arc` and never mutated.
pub struct ModelManager {
    models: RwLock<HashMap<PathBuf, ModelHandle>>,
    loader: ModelLoader,
    config: ModelManagerConfig,
}

impl ModelManager {
    /// Create a new model manager that reads JSON pipeline artifacts.
    pub fn new(config: ModelManagerConfig) -> Self {
        Self::with_loader(config, Arc::new(load_model))
    }

    /// Create a model manager with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ModelManagerConfig::default())
    }

    /// Create a model manager with a custom artifact loader.
    pub fn with_loader(config: ModelManagerConfig, loader: ModelLoader) -> Self {
        Self {
            models: RwLock::new(HashMap::new()),
            loader,
            config,
        }
    }

    /// Get or lazily load the model at `path`.
    ///
    /// Uses double-checked locking to ensure thread-safe lazy loading.
    /// Failed loads are not cached.
    pub fn load(&self, path: &Path) -> Result<ModelHandle> {
        let key = cache_key(path);

        // Fast path: check if already loaded (read lock)
        {
            let models = self.models.read().map_err(|e| {
                AppraiseError::Configuration(format!("Failed to acquire read lock: {}", e))
            })?;

            if let Some(handle) = models.get(&key) {
                return Ok(handle.clone());
            }
        }

        // Slow path: need to load (write lock)
        let mut models = self.models.write().map_err(|e| {
            AppraiseError::Configuration(format!("Failed to acquire write lock: {}", e))
        })?;

        // Double-check after acquiring write lock
        if let Some(handle) = models.get(&key) {
            return Ok(handle.clone());
        }

        debug!(path = %key.display(), "loading model");
        let handle = (self.loader)(&key)?;
        models.insert(key, handle.clone());

        Ok(handle)
    }

    /// Resolve a source (downloading if needed) and load it.
    pub async fn load_source(&self, source: &ModelSource) -> Result<ModelHandle> {
        let path = source.resolve(&self.config.cache_dir).await?;
        self.load(&path)
    }

    /// Explicitly preload a model.
    ///
    /// Useful at startup so that a missing or broken artifact fails the
    /// process before the first request arrives.
    pub fn preload(&self, path: &Path) -> Result<()> {
        let _ = self.load(path)?;
        Ok(())
    }

    /// Drop a model from the cache.
    ///
    /// Returns true if the model was found and removed. Handles already
    /// given out stay valid.
    pub fn unload(&self, path: &Path) -> bool {
        let key = cache_key(path);
        self.models
            .write()
            .map(|mut models| models.remove(&key).is_some())
            .unwrap_or(false)
    }

    /// Models currently held, sorted by path.
    pub fn loaded_models(&self) -> Vec<LoadedModel> {
        let mut loaded: Vec<LoadedModel> = self
            .models
            .read()
            .map(|models| {
                models
                    .iter()
                    .map(|(path, handle)| LoadedModel {
                        id: handle.id().to_string(),
                        path: path.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        loaded.sort_by(|a, b| a.path.cmp(&b.path));
        loaded
    }

    /// Get the configuration.
    pub fn config(&self) -> &ModelManagerConfig {
        &self.config
    }
}

/// Canonical form of `path` when it exists, so aliases share one entry.
fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
