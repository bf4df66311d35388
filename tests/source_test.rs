//! Integration tests for [`ModelSource`]: remote download, caching, and
//! loading downloaded artifacts through the manager.

use std::path::{Path, PathBuf};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appraise::{AppraiseError, ModelManager, ModelManagerConfig, ModelSource};

fn fixture_bytes(name: &str) -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read(path).unwrap()
}

#[tokio::test]
async fn remote_source_downloads_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models/performance_tree.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(fixture_bytes("performance_tree.json")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let source = ModelSource::remote(format!("{}/models/performance_tree.json", server.uri()));

    let first = source.resolve(dir.path()).await.unwrap();
    let second = source.resolve(dir.path()).await.unwrap();

    assert!(first.starts_with(dir.path()));
    assert!(first.ends_with("models/performance_tree.json"));
    assert_eq!(first, second);
    assert!(first.exists());
    assert!(!first.with_extension("part").exists());
    // `expect(1)` is verified when the server drops.
}

#[tokio::test]
async fn refresh_always_downloads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/model.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(fixture_bytes("performance_linear.json")),
        )
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let source = ModelSource::remote(format!("{}/model.json", server.uri()));
    source.resolve(dir.path()).await.unwrap();
    source.refresh(dir.path()).await.unwrap();
}

#[tokio::test]
async fn remote_404_is_model_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let url = format!("{}/missing.json", server.uri());
    let err = ModelSource::remote(&url)
        .resolve(dir.path())
        .await
        .unwrap_err();

    match err {
        AppraiseError::ModelNotFound(p) => assert_eq!(p, PathBuf::from(url)),
        other => panic!("expected ModelNotFound, got {other:?}"),
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn urls_sharing_a_file_name_are_cached_apart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/model.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("V1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/model.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("V2"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let v1 = ModelSource::remote(format!("{}/v1/model.json", server.uri()))
        .resolve(dir.path())
        .await
        .unwrap();
    let v2 = ModelSource::remote(format!("{}/v2/model.json", server.uri()))
        .resolve(dir.path())
        .await
        .unwrap();

    assert_ne!(v1, v2);
    assert_eq!(std::fs::read_to_string(&v1).unwrap(), "V1");
    assert_eq!(std::fs::read_to_string(&v2).unwrap(), "V2");
}

#[tokio::test]
async fn remote_server_error_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = ModelSource::remote(format!("{}/model.json", server.uri()))
        .resolve(dir.path())
        .await
        .unwrap_err();
    assert!(matches!(err, AppraiseError::Http(_)), "{err}");
}

#[tokio::test]
async fn manager_loads_remote_source_into_cache_dir() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hr/perf.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(fixture_bytes("performance_linear.json")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let manager = ModelManager::new(ModelManagerConfig {
        cache_dir: dir.path().join("models"),
    });
    let source = ModelSource::remote_as(format!("{}/hr/perf.json", server.uri()), "current.json");

    let first = manager.load_source(&source).await.unwrap();
    let second = manager.load_source(&source).await.unwrap();

    assert_eq!(first.id(), "employee-performance-linear");
    assert!(first.ptr_eq(&second));
    assert!(dir.path().join("models").join("current.json").exists());
}

#[tokio::test]
async fn local_source_missing_file_fails_to_load() {
    let manager = ModelManager::with_defaults();
    let err = manager
        .load_source(&ModelSource::local("/nonexistent/model.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppraiseError::ModelNotFound(_)));
}
