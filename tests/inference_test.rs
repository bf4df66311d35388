//! Tests for single-record inference against custom classifiers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use appraise::{
    AppraiseError, BoxError, ClassDistribution, Classifier, EmployeeRecord, FeatureSchema,
    FeatureSpec, Label, ModelHandle, ValidatedRecord, predict, validate,
};

// ============================================================================
// Mock classifiers
// ============================================================================

/// Returns a fixed outcome and counts invocations.
struct ScriptedClassifier {
    label: Label,
    distribution: Option<ClassDistribution>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedClassifier {
    fn label(label: Label) -> Self {
        Self {
            label,
            distribution: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn distribution(label: Label, distribution: &[(Label, f64)]) -> Self {
        Self {
            label,
            distribution: Some(distribution.iter().copied().collect()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Classifier for ScriptedClassifier {
    fn name(&self) -> &str {
        "scripted"
    }

    fn classes(&self) -> &[Label] {
        &[2, 3, 4]
    }

    fn classify(&self, _record: &ValidatedRecord) -> Result<Label, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.label)
    }

    fn exposes_probabilities(&self) -> bool {
        self.distribution.is_some()
    }

    fn classify_with_confidence(
        &self,
        _record: &ValidatedRecord,
    ) -> Result<(Label, ClassDistribution), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.distribution {
            Some(d) => Ok((self.label, d.clone())),
            None => Err("no distribution".into()),
        }
    }
}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn name(&self) -> &str {
        "failing"
    }

    fn classes(&self) -> &[Label] {
        &[2, 3, 4]
    }

    fn classify(&self, _record: &ValidatedRecord) -> Result<Label, BoxError> {
        Err("feature matrix has 14 columns, expected 15".into())
    }
}

struct PanickingClassifier;

impl Classifier for PanickingClassifier {
    fn name(&self) -> &str {
        "panicking"
    }

    fn classes(&self) -> &[Label] {
        &[2, 3, 4]
    }

    fn classify(&self, _record: &ValidatedRecord) -> Result<Label, BoxError> {
        panic!("index out of bounds");
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn schema() -> FeatureSchema {
    FeatureSchema::new(vec![
        FeatureSpec::integer("EmpLastSalaryHikePercent", 0, 25),
        FeatureSpec::categorical("EmpDepartment", ["Sales", "Finance"]),
    ])
    .unwrap()
}

fn validated(schema: &FeatureSchema) -> ValidatedRecord {
    let record = EmployeeRecord::new()
        .with("EmpLastSalaryHikePercent", 15)
        .with("EmpDepartment", "Sales");
    validate(&record, schema).unwrap()
}

fn run(classifier: impl Classifier + 'static) -> appraise::Result<appraise::PredictionResult> {
    let schema = schema();
    let record = validated(&schema);
    let handle = ModelHandle::new(schema, classifier);
    predict(&handle, &record)
}

fn inference_cause(result: appraise::Result<appraise::PredictionResult>) -> (String, String) {
    match result {
        Err(AppraiseError::Inference { model, source }) => (model, source.to_string()),
        other => panic!("expected inference error, got {other:?}"),
    }
}

// ============================================================================
// Successful inference
// ============================================================================

#[test]
fn label_only_classifier_has_full_confidence() {
    let result = run(ScriptedClassifier::label(3)).unwrap();
    assert_eq!(result.label(), 3);
    assert_eq!(result.confidence(), 1.0);
    assert!(result.probabilities().is_none());
}

#[test]
fn distribution_sets_confidence_to_winning_probability() {
    let result =
        run(ScriptedClassifier::distribution(4, &[(2, 0.1), (3, 0.2), (4, 0.7)])).unwrap();
    assert_eq!(result.label(), 4);
    assert_eq!(result.confidence(), 0.7);
    assert_eq!(result.probability(3), Some(0.2));
}

#[test]
fn distribution_within_tolerance_is_accepted() {
    let result = run(ScriptedClassifier::distribution(
        3,
        &[(2, 0.2), (3, 0.5), (4, 0.3 + 5e-7)],
    ));
    assert!(result.is_ok());
}

#[test]
fn classifier_runs_exactly_once_per_prediction() {
    let classifier = ScriptedClassifier::distribution(3, &[(2, 0.2), (3, 0.5), (4, 0.3)]);
    let calls = classifier.calls.clone();
    run(classifier).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn same_input_gives_same_result() {
    let schema = schema();
    let record = validated(&schema);
    let handle = ModelHandle::new(
        schema,
        ScriptedClassifier::distribution(2, &[(2, 0.6), (3, 0.3), (4, 0.1)]),
    );
    let first = predict(&handle, &record).unwrap();
    let second = predict(&handle, &record).unwrap();
    assert_eq!(first, second);
}

#[test]
fn concurrent_predictions_share_one_model() {
    let schema = schema();
    let record = Arc::new(validated(&schema));
    let classifier = ScriptedClassifier::label(4);
    let calls = classifier.calls.clone();
    let handle = ModelHandle::new(schema, classifier);

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let handle = handle.clone();
            let record = Arc::clone(&record);
            std::thread::spawn(move || {
                (0..25)
                    .map(|_| predict(&handle, &record).unwrap().label())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for thread in threads {
        assert!(thread.join().unwrap().iter().all(|&label| label == 4));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 200);
}

// ============================================================================
// Faults become inference errors
// ============================================================================

#[test]
fn classifier_error_is_wrapped_with_cause() {
    let (model, cause) = inference_cause(run(FailingClassifier));
    assert_eq!(model, "failing");
    assert!(cause.contains("14 columns"), "{cause}");
}

#[test]
fn classifier_panic_is_contained() {
    let (model, cause) = inference_cause(run(PanickingClassifier));
    assert_eq!(model, "panicking");
    assert!(cause.contains("index out of bounds"), "{cause}");
}

#[test]
fn label_outside_classes_is_rejected() {
    let (_, cause) = inference_cause(run(ScriptedClassifier::label(7)));
    assert!(cause.contains('7'), "{cause}");
}

#[test]
fn probability_outside_unit_interval_is_rejected() {
    let (_, cause) = inference_cause(run(ScriptedClassifier::distribution(
        3,
        &[(2, -0.2), (3, 1.0), (4, 0.2)],
    )));
    assert!(cause.contains("outside [0, 1]"), "{cause}");
}

#[test]
fn unnormalized_distribution_is_rejected() {
    let (_, cause) = inference_cause(run(ScriptedClassifier::distribution(
        3,
        &[(2, 0.3), (3, 0.5), (4, 0.3)],
    )));
    assert!(cause.contains("sum"), "{cause}");
}

#[test]
fn label_the_model_rates_unlikely_is_rejected() {
    let (model, cause) = inference_cause(run(ScriptedClassifier::distribution(
        2,
        &[(2, 0.1), (3, 0.9)],
    )));
    assert!(!model.is_empty());
    assert!(cause.contains("below the top class"), "{cause}");
}

#[test]
fn distribution_over_unknown_class_is_rejected() {
    let result = run(ScriptedClassifier::distribution(3, &[(3, 0.5), (9, 0.5)]));
    assert!(matches!(result, Err(AppraiseError::Inference { .. })));
}

#[test]
fn record_for_another_schema_is_rejected() {
    let other = FeatureSchema::new(vec![FeatureSpec::integer("Age", 18, 60)]).unwrap();
    let record = validate(&EmployeeRecord::new().with("Age", 30), &other).unwrap();
    let classifier = ScriptedClassifier::label(3);
    let calls = classifier.calls.clone();
    let handle = ModelHandle::new(schema(), classifier);

    let result = predict(&handle, &record);
    assert!(matches!(result, Err(AppraiseError::Inference { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn inference_errors_are_recoverable() {
    let err = run(FailingClassifier).unwrap_err();
    assert!(err.is_recoverable());
    assert!(std::error::Error::source(&err).is_some());
}
