//! Tests for loading model artifacts from disk.

use std::path::{Path, PathBuf};

use appraise::{AppraiseError, EmployeeRecord, FeatureKind, load_model, predict, validate};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn record(env: i64, hike: i64, wlb: i64, ysp: i64) -> EmployeeRecord {
    EmployeeRecord::new()
        .with("Age", 30)
        .with("Gender", "Male")
        .with("EmpDepartment", "Sales")
        .with("EmpEnvironmentSatisfaction", env)
        .with("EmpLastSalaryHikePercent", hike)
        .with("EmpWorkLifeBalance", wlb)
        .with("YearsSinceLastPromotion", ysp)
        .with("EmpJobSatisfaction", 3)
        .with("EmpJobInvolvement", 3)
}

/// (record, expected label) cases both fixture models agree on.
fn cases() -> Vec<(EmployeeRecord, i64)> {
    vec![
        (record(3, 15, 3, 2), 3),
        (record(5, 24, 4, 0), 4),
        (record(1, 11, 2, 10), 2),
    ]
}

// ============================================================================
// Fixtures
// ============================================================================

#[test]
fn linear_fixture_loads_with_schema() {
    let handle = load_model(&fixture("performance_linear.json")).unwrap();
    assert_eq!(handle.id(), "employee-performance-linear");
    assert_eq!(handle.classes(), &[2, 3, 4]);

    let schema = handle.schema();
    assert_eq!(schema.len(), 9);
    assert_eq!(schema.position("EmpDepartment"), Some(2));
    assert!(matches!(
        schema.feature("EmpLastSalaryHikePercent").map(|f| &f.kind),
        Some(FeatureKind::Numeric { min, max, integer: true }) if *min == 0.0 && *max == 25.0
    ));
    assert!(handle.classifier().exposes_probabilities());
}

#[test]
fn linear_fixture_predicts_expected_labels() {
    let handle = load_model(&fixture("performance_linear.json")).unwrap();
    for (record, expected) in cases() {
        let validated = validate(&record, handle.schema()).unwrap();
        let result = predict(&handle, &validated).unwrap();
        assert_eq!(result.label(), expected, "record {record:?}");

        let probabilities = result.probabilities().expect("linear models expose probabilities");
        let sum: f64 = probabilities.values().sum();
        assert!((sum - 1.0).abs() <= 1e-6);
        assert_eq!(result.confidence(), probabilities[&expected]);
    }
}

#[test]
fn average_employee_is_moderately_confident() {
    let handle = load_model(&fixture("performance_linear.json")).unwrap();
    let validated = validate(&record(3, 15, 3, 2), handle.schema()).unwrap();
    let result = predict(&handle, &validated).unwrap();
    // softmax of [-0.5, 1.0, -0.5]
    assert!((result.confidence() - 0.6914).abs() < 1e-3);
    let low = result.probability(2).unwrap();
    let high = result.probability(4).unwrap();
    assert!((low - high).abs() < 1e-12);
}

#[test]
fn tree_fixture_predicts_expected_labels() {
    let handle = load_model(&fixture("performance_tree.json")).unwrap();
    assert!(!handle.classifier().exposes_probabilities());
    for (record, expected) in cases() {
        let validated = validate(&record, handle.schema()).unwrap();
        let result = predict(&handle, &validated).unwrap();
        assert_eq!(result.label(), expected);
        assert!(result.probabilities().is_none());
        assert_eq!(result.confidence(), 1.0);
    }
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn missing_file_is_model_not_found() {
    let path = fixture("does_not_exist.json");
    match load_model(&path) {
        Err(AppraiseError::ModelNotFound(p)) => assert_eq!(p, path),
        other => panic!("expected ModelNotFound, got {:?}", other.map(|h| h.id().to_string())),
    }
}

#[test]
fn malformed_json_is_model_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = load_model(&path).err().unwrap();
    assert!(matches!(err, AppraiseError::ModelLoad { .. }), "{err}");
    assert!(!err.is_recoverable());
}

#[test]
fn coefficient_width_mismatch_is_model_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("narrow.json");
    let json = r#"{
        "format_version": 1,
        "name": "narrow",
        "classes": [2, 3],
        "features": [
            {"name": "Age", "kind": "numeric", "min": 18, "max": 60, "integer": true},
            {"name": "Gender", "kind": "categorical", "categories": ["Male", "Female"]}
        ],
        "estimator": {"type": "linear", "intercepts": [0, 0], "coefficients": [[1], [2]]}
    }"#;
    std::fs::write(&path, json).unwrap();

    match load_model(&path) {
        Err(AppraiseError::ModelLoad { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected ModelLoad, got {:?}", other.map(|h| h.id().to_string())),
    }
}

#[test]
fn tree_leaf_outside_classes_is_model_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.json");
    let json = r#"{
        "format_version": 1,
        "name": "bad-tree",
        "classes": [2, 3],
        "features": [{"name": "Age", "kind": "numeric", "min": 18, "max": 60}],
        "estimator": {"type": "tree", "nodes": [
            {"feature": 0, "threshold": 0.0, "left": 1, "right": 2},
            {"class": 2},
            {"class": 5}
        ]}
    }"#;
    std::fs::write(&path, json).unwrap();

    let err = load_model(&path).err().unwrap();
    assert!(matches!(err, AppraiseError::ModelLoad { .. }), "{err}");
}

#[test]
fn duplicate_feature_is_model_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dup.json");
    let json = r#"{
        "format_version": 1,
        "name": "dup",
        "classes": [2, 3],
        "features": [
            {"name": "Age", "kind": "numeric", "min": 18, "max": 60},
            {"name": "Age", "kind": "numeric", "min": 18, "max": 60}
        ],
        "estimator": {"type": "linear", "intercepts": [0, 0], "coefficients": [[1, 1], [2, 2]]}
    }"#;
    std::fs::write(&path, json).unwrap();

    let err = load_model(&path).err().unwrap();
    assert!(err.to_string().contains("Age"), "{err}");
}
