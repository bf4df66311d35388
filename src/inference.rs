//! Single-record inference against a loaded model.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use tracing::{instrument, warn};

use crate::contract::ValidatedRecord;
use crate::error::BoxError;
use crate::model::ModelHandle;
use crate::types::{ClassDistribution, Label, PROBABILITY_TOLERANCE, PredictionResult};
use crate::{AppraiseError, Result, telemetry};

/// Faults detected in a classifier's output or execution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OutputFault {
    #[error("record does not match the model's feature schema")]
    SchemaMismatch,

    #[error("classifier panicked: {0}")]
    Panicked(String),

    #[error("label {label} is not one of the model's classes {classes:?}")]
    UnknownLabel { label: Label, classes: Vec<Label> },

    #[error("probability for class {label} is {value}, outside [0, 1]")]
    InvalidProbability { label: Label, value: f64 },

    #[error("probabilities sum to {sum}, expected 1")]
    UnnormalizedDistribution { sum: f64 },

    #[error("label {label} has probability {probability}, below the top class at {top}")]
    LabelNotMostLikely {
        label: Label,
        probability: f64,
        top: f64,
    },
}

/// Run the model once on a validated record.
///
/// The classifier is invoked exactly once; failures are never retried.
/// Every fault (an error, a panic, output outside the model's declared
/// classes, or a label that is not the most probable class of its own
/// distribution) comes back as [`AppraiseError::Inference`] with the original
/// cause as its source.
#[instrument(skip(handle, record), fields(model = handle.id()))]
pub fn predict(handle: &ModelHandle, record: &ValidatedRecord) -> Result<PredictionResult> {
    let start = Instant::now();
    let outcome = run_classifier(handle, record);
    metrics::histogram!(telemetry::INFERENCE_DURATION_SECONDS, "model" => handle.id().to_string())
        .record(start.elapsed().as_secs_f64());

    let status = if outcome.is_ok() { "ok" } else { "error" };
    metrics::counter!(
        telemetry::PREDICTIONS_TOTAL,
        "model" => handle.id().to_string(),
        "status" => status
    )
    .increment(1);

    outcome.map_err(|cause| {
        warn!(input = ?record, error = %cause, "inference failed");
        AppraiseError::inference(handle.id(), cause)
    })
}

fn run_classifier(
    handle: &ModelHandle,
    record: &ValidatedRecord,
) -> std::result::Result<PredictionResult, BoxError> {
    if !record.conforms_to(handle.schema()) {
        return Err(Box::new(OutputFault::SchemaMismatch));
    }

    let classifier = handle.classifier();
    let invoked = catch_unwind(AssertUnwindSafe(|| {
        if classifier.exposes_probabilities() {
            classifier
                .classify_with_confidence(record)
                .map(|(label, distribution)| (label, Some(distribution)))
        } else {
            classifier.classify(record).map(|label| (label, None))
        }
    }));

    let (label, distribution) = match invoked {
        Ok(result) => result?,
        Err(payload) => return Err(Box::new(OutputFault::Panicked(panic_message(payload)))),
    };

    let classes = handle.classes();
    if !classes.contains(&label) {
        return Err(Box::new(OutputFault::UnknownLabel {
            label,
            classes: classes.to_vec(),
        }));
    }

    match distribution {
        Some(distribution) => {
            check_distribution(label, &distribution, classes)?;
            Ok(PredictionResult::from_distribution(label, distribution))
        }
        None => Ok(PredictionResult::from_label(label)),
    }
}

fn check_distribution(
    label: Label,
    distribution: &ClassDistribution,
    classes: &[Label],
) -> std::result::Result<(), OutputFault> {
    for (&label, &value) in distribution {
        if !classes.contains(&label) {
            return Err(OutputFault::UnknownLabel {
                label,
                classes: classes.to_vec(),
            });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(OutputFault::InvalidProbability { label, value });
        }
    }
    let sum: f64 = distribution.values().sum();
    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(OutputFault::UnnormalizedDistribution { sum });
    }

    // Ties within tolerance are left to the classifier.
    let probability = distribution.get(&label).copied().unwrap_or(0.0);
    let top = distribution.values().copied().fold(0.0_f64, f64::max);
    if probability + PROBABILITY_TOLERANCE < top {
        return Err(OutputFault::LabelNotMostLikely {
            label,
            probability,
            top,
        });
    }
    Ok(())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_must_sum_to_one() {
        let dist = ClassDistribution::from([(2, 0.5), (3, 0.4)]);
        let err = check_distribution(2, &dist, &[2, 3]).unwrap_err();
        assert!(matches!(err, OutputFault::UnnormalizedDistribution { .. }));
    }

    #[test]
    fn distribution_within_tolerance_is_accepted() {
        let dist = ClassDistribution::from([(2, 0.5), (3, 0.5 + 5e-7)]);
        assert!(check_distribution(3, &dist, &[2, 3]).is_ok());
    }

    #[test]
    fn nan_probability_is_rejected() {
        let dist = ClassDistribution::from([(2, f64::NAN), (3, 1.0)]);
        let err = check_distribution(3, &dist, &[2, 3]).unwrap_err();
        assert!(matches!(err, OutputFault::InvalidProbability { label: 2, .. }));
    }

    #[test]
    fn label_must_be_most_likely_class() {
        let dist = ClassDistribution::from([(2, 0.1), (3, 0.9)]);
        let err = check_distribution(2, &dist, &[2, 3]).unwrap_err();
        assert_eq!(
            err,
            OutputFault::LabelNotMostLikely {
                label: 2,
                probability: 0.1,
                top: 0.9
            }
        );
    }

    #[test]
    fn tied_label_is_accepted() {
        let dist = ClassDistribution::from([(2, 0.5), (3, 0.5)]);
        assert!(check_distribution(2, &dist, &[2, 3]).is_ok());
        assert!(check_distribution(3, &dist, &[2, 3]).is_ok());
    }

    #[test]
    fn panic_message_from_str_and_string() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(42_u8)), "unknown panic payload");
    }
}
