//! Feature contract: turns a raw [`EmployeeRecord`] into a [`ValidatedRecord`].
//!
//! Policies, identical for every caller:
//!
//! - every declared feature must be present;
//! - numbers outside their declared range are rejected, never clamped;
//! - categorical values must match a declared category exactly (case and
//!   whitespace included);
//! - fields the schema does not declare are dropped.
//!
//! Features are checked in schema order and the first failure is reported,
//! so a given record always produces the same error.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{EmployeeRecord, FeatureKind, FeatureSchema, FeatureSpec, FeatureValue};

/// Why a feature value was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ValidationReason {
    #[error("required feature is missing")]
    Missing,

    #[error("expected a number, got {found}")]
    ExpectedNumber { found: String },

    #[error("expected a category name, got {found}")]
    ExpectedCategory { found: String },

    #[error("value must be a finite number")]
    NotFinite,

    #[error("value {value} is not a whole number")]
    NotInteger { value: f64 },

    #[error("value {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("unknown category {value:?}, expected one of {allowed:?}")]
    UnknownCategory { value: String, allowed: Vec<String> },
}

/// A rejected record: which field failed and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("invalid feature '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }

    /// Stable short name of the reason, used as a metric label.
    pub fn reason_code(&self) -> &'static str {
        match self.reason {
            ValidationReason::Missing => "missing",
            ValidationReason::ExpectedNumber { .. } => "expected_number",
            ValidationReason::ExpectedCategory { .. } => "expected_category",
            ValidationReason::NotFinite => "not_finite",
            ValidationReason::NotInteger { .. } => "not_integer",
            ValidationReason::OutOfRange { .. } => "out_of_range",
            ValidationReason::UnknownCategory { .. } => "unknown_category",
        }
    }
}

/// A checked feature value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedValue {
    Numeric(f64),
    Category(String),
}

impl ValidatedValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Category(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            Self::Numeric(_) => None,
            Self::Category(c) => Some(c),
        }
    }
}

/// A record that satisfies a schema: one value per declared feature, in
/// schema order. Only [`validate`] produces one.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    entries: Vec<(String, ValidatedValue)>,
}

impl ValidatedRecord {
    /// Values in schema order.
    pub fn values(&self) -> impl Iterator<Item = &ValidatedValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Name/value pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidatedValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Option<&ValidatedValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether this record carries exactly the features of `schema`, in order.
    pub fn conforms_to(&self, schema: &FeatureSchema) -> bool {
        self.entries.len() == schema.len()
            && self
                .entries
                .iter()
                .zip(schema.names())
                .all(|((name, _), expected)| name == expected)
    }
}

/// Check a raw record against a schema.
pub fn validate(
    record: &EmployeeRecord,
    schema: &FeatureSchema,
) -> Result<ValidatedRecord, ValidationError> {
    let mut entries = Vec::with_capacity(schema.len());
    for spec in schema.features() {
        let raw = record
            .get(&spec.name)
            .ok_or_else(|| ValidationError::new(&spec.name, ValidationReason::Missing))?;
        let value = check_value(spec, raw)
            .map_err(|reason| ValidationError::new(&spec.name, reason))?;
        entries.push((spec.name.clone(), value));
    }

    if record.len() > entries.len() {
        for (name, _) in record.iter().filter(|(name, _)| schema.feature(name).is_none()) {
            debug!(field = name, "dropping undeclared field");
        }
    }

    Ok(ValidatedRecord { entries })
}

fn check_value(
    spec: &FeatureSpec,
    raw: &FeatureValue,
) -> Result<ValidatedValue, ValidationReason> {
    match (&spec.kind, raw) {
        (FeatureKind::Numeric { min, max, integer }, FeatureValue::Number(value)) => {
            let value = *value;
            if !value.is_finite() {
                return Err(ValidationReason::NotFinite);
            }
            if *integer && value.fract() != 0.0 {
                return Err(ValidationReason::NotInteger { value });
            }
            if value < *min || value > *max {
                return Err(ValidationReason::OutOfRange {
                    value,
                    min: *min,
                    max: *max,
                });
            }
            Ok(ValidatedValue::Numeric(value))
        }
        (FeatureKind::Numeric { .. }, other) => Err(ValidationReason::ExpectedNumber {
            found: other.to_string(),
        }),
        (FeatureKind::Categorical { categories }, FeatureValue::Text(text)) => {
            if categories.iter().any(|c| c == text) {
                Ok(ValidatedValue::Category(text.clone()))
            } else {
                Err(ValidationReason::UnknownCategory {
                    value: text.clone(),
                    allowed: categories.clone(),
                })
            }
        }
        (FeatureKind::Categorical { .. }, other) => Err(ValidationReason::ExpectedCategory {
            found: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec![
            FeatureSpec::integer("Age", 18, 60),
            FeatureSpec::categorical("Gender", ["Male", "Female"]),
        ])
        .unwrap()
    }

    #[test]
    fn keeps_schema_order() {
        let record = EmployeeRecord::new()
            .with("Gender", "Female")
            .with("Age", 44);
        let validated = validate(&record, &schema()).unwrap();
        let names: Vec<_> = validated.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["Age", "Gender"]);
        assert!(validated.conforms_to(&schema()));
    }

    #[test]
    fn bounds_are_inclusive() {
        for age in [18, 60] {
            let record = EmployeeRecord::new().with("Age", age).with("Gender", "Male");
            assert!(validate(&record, &schema()).is_ok(), "age {age}");
        }
    }

    #[test]
    fn reason_codes_are_stable() {
        let err = ValidationError::new("Age", ValidationReason::Missing);
        assert_eq!(err.reason_code(), "missing");
        assert_eq!(err.to_string(), "invalid feature 'Age': required feature is missing");
    }
}
