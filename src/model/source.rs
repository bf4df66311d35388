//! Where a model artifact comes from.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::{AppraiseError, Result};

/// Source for a model artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Artifact on the local filesystem.
    Local {
        /// Path to the artifact file.
        path: PathBuf,
    },

    /// Artifact served over HTTP(S), downloaded once into the cache directory.
    Remote {
        /// URL of the artifact.
        url: String,
        /// Location of the download, relative to the cache directory.
        cache_path: PathBuf,
    },
}

impl ModelSource {
    /// Create a local source.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    /// Create a remote source, cached under `<host>/<path segments>` so that
    /// distinct URLs never share a file.
    pub fn remote(url: impl Into<String>) -> Self {
        let url = url.into();
        let cache_path = cache_path_from_url(&url);
        Self::Remote { url, cache_path }
    }

    /// Create a remote source with an explicit cache location.
    pub fn remote_as(url: impl Into<String>, cache_path: impl Into<PathBuf>) -> Self {
        Self::Remote {
            url: url.into(),
            cache_path: cache_path.into(),
        }
    }

    /// Resolve to a local path, downloading remote artifacts if not cached.
    pub async fn resolve(&self, cache_dir: &Path) -> Result<PathBuf> {
        match self {
            Self::Local { path } => Ok(path.clone()),
            Self::Remote { url, cache_path } => {
                let path = cache_dir.join(cache_path);
                if path.exists() {
                    return Ok(path);
                }
                download(url, &path).await?;
                Ok(path)
            }
        }
    }

    /// Like [`resolve`](Self::resolve), but always re-downloads remote artifacts.
    pub async fn refresh(&self, cache_dir: &Path) -> Result<PathBuf> {
        match self {
            Self::Local { path } => Ok(path.clone()),
            Self::Remote { url, cache_path } => {
                let path = cache_dir.join(cache_path);
                download(url, &path).await?;
                Ok(path)
            }
        }
    }
}

/// Relative cache path for a URL: host (with port) followed by the path
/// segments. Scheme, query and fragment are ignored.
fn cache_path_from_url(url: &str) -> PathBuf {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let without_scheme = without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest);

    let mut path: PathBuf = without_scheme
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(sanitize_segment)
        .collect();

    // A bare host would otherwise name a directory, not a file.
    if path.components().count() < 2 {
        path.push("model.json");
    }
    path
}

fn sanitize_segment(segment: &str) -> String {
    if segment == "." || segment == ".." {
        return "_".to_string();
    }
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Fetch `url` into `dest` (atomic write via tmp + rename).
async fn download(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| AppraiseError::Http(format!("failed to fetch model from {url}: {e}")))?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(AppraiseError::ModelNotFound(PathBuf::from(url)));
    }
    if !response.status().is_success() {
        return Err(AppraiseError::Http(format!(
            "model fetch from {url} returned HTTP {}",
            response.status()
        )));
    }

    let body = response.bytes().await.map_err(|e| {
        AppraiseError::Http(format!("failed to read model response body: {e}"))
    })?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppraiseError::Configuration(format!(
                "failed to create cache dir {}: {e}",
                parent.display()
            ))
        })?;
    }

    let tmp_path = dest.with_extension("part");
    std::fs::write(&tmp_path, &body).map_err(|e| {
        AppraiseError::Configuration(format!(
            "failed to write {}: {e}",
            tmp_path.display()
        ))
    })?;
    std::fs::rename(&tmp_path, dest).map_err(|e| {
        AppraiseError::Configuration(format!(
            "failed to rename {} → {}: {e}",
            tmp_path.display(),
            dest.display()
        ))
    })?;

    info!(url, path = %dest.display(), bytes = body.len(), "model artifact downloaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_cache_path_from_url() {
        let source = ModelSource::remote("https://models.example.com/hr/perf-v3.json?sig=abc");
        assert_eq!(
            source,
            ModelSource::Remote {
                url: "https://models.example.com/hr/perf-v3.json?sig=abc".to_string(),
                cache_path: PathBuf::from("models.example.com/hr/perf-v3.json"),
            }
        );
    }

    #[test]
    fn cache_path_keeps_versions_apart() {
        assert_ne!(
            cache_path_from_url("https://h/v1/model.json"),
            cache_path_from_url("https://h/v2/model.json")
        );
        assert_ne!(
            cache_path_from_url("http://127.0.0.1:8080/model.json"),
            cache_path_from_url("http://127.0.0.1:8081/model.json")
        );
    }

    #[test]
    fn cache_path_edge_cases() {
        assert_eq!(
            cache_path_from_url("https://models.example.com"),
            PathBuf::from("models.example.com/model.json")
        );
        assert_eq!(cache_path_from_url("https://"), PathBuf::from("model.json"));
        assert_eq!(
            cache_path_from_url("https://h/../etc/passwd"),
            PathBuf::from("h/_/etc/passwd")
        );
        assert_eq!(
            cache_path_from_url("http://localhost:9000/m.json"),
            PathBuf::from("localhost_9000/m.json")
        );
    }

    #[tokio::test]
    async fn local_resolves_to_itself() {
        let source = ModelSource::local("/opt/models/perf.json");
        let path = source.resolve(Path::new("/unused")).await.unwrap();
        assert_eq!(path, PathBuf::from("/opt/models/perf.json"));
    }
}
