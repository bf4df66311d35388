//! Tests for feature schema construction.

use appraise::{AppraiseError, FeatureSchema, FeatureSpec};

fn invalid(specs: Vec<FeatureSpec>) -> String {
    match FeatureSchema::new(specs) {
        Err(AppraiseError::InvalidSchema(reason)) => reason,
        other => panic!("expected InvalidSchema, got {other:?}"),
    }
}

#[test]
fn schema_keeps_declaration_order() {
    let schema = FeatureSchema::new(vec![
        FeatureSpec::integer("YearsSinceLastPromotion", 0, 15),
        FeatureSpec::integer("Age", 18, 60),
        FeatureSpec::categorical("Gender", ["Male", "Female"]),
    ])
    .unwrap();
    let names: Vec<_> = schema.names().collect();
    assert_eq!(names, ["YearsSinceLastPromotion", "Age", "Gender"]);
    assert_eq!(schema.position("Gender"), Some(2));
    assert_eq!(schema.position("Salary"), None);
}

#[test]
fn empty_schema_is_rejected() {
    assert!(invalid(vec![]).contains("no features"));
}

#[test]
fn duplicate_names_are_rejected() {
    let reason = invalid(vec![
        FeatureSpec::integer("Age", 18, 60),
        FeatureSpec::numeric("Age", 0.0, 1.0),
    ]);
    assert!(reason.contains("Age"));
}

#[test]
fn inverted_bounds_are_rejected() {
    let reason = invalid(vec![FeatureSpec::integer("EmpWorkLifeBalance", 5, 1)]);
    assert!(reason.contains("EmpWorkLifeBalance"));
}

#[test]
fn non_finite_bounds_are_rejected() {
    invalid(vec![FeatureSpec::numeric("Score", 0.0, f64::INFINITY)]);
}

#[test]
fn empty_or_repeated_categories_are_rejected() {
    invalid(vec![FeatureSpec::categorical("Gender", Vec::<String>::new())]);
    invalid(vec![FeatureSpec::categorical(
        "EmpDepartment",
        ["Sales", "Finance", "Sales"],
    )]);
}

#[test]
fn single_point_domain_is_allowed() {
    let schema = FeatureSchema::new(vec![FeatureSpec::integer("Version", 1, 1)]).unwrap();
    assert_eq!(schema.len(), 1);
}

#[test]
fn schema_json_roundtrip() {
    let schema = FeatureSchema::new(vec![
        FeatureSpec::integer("Age", 18, 60),
        FeatureSpec::categorical("Gender", ["Male", "Female"]),
    ])
    .unwrap();
    let json = serde_json::to_string(&schema).unwrap();
    let back: FeatureSchema = serde_json::from_str(&json).unwrap();
    assert_eq!(back, schema);
}

#[test]
fn invalid_schema_json_fails_to_deserialize() {
    let json = r#"[
        {"name": "Age", "kind": "numeric", "min": 60, "max": 18}
    ]"#;
    assert!(serde_json::from_str::<FeatureSchema>(json).is_err());
}
