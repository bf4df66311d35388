//! Raw input values as submitted by a form or API caller.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single raw attribute value.
///
/// Deserializes from any JSON value. Numbers and strings are the only kinds a
/// schema accepts; anything else lands in `Other` so that validation can
/// reject it against the field it was sent for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    /// `null`, a boolean, an array or an object.
    Other(serde_json::Value),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FeatureValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for FeatureValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<serde_json::Value> for FeatureValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(n) => Self::Number(n),
                None => Self::Other(serde_json::Value::Number(n)),
            },
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Other(other),
        }
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// One submission of raw employee attributes, keyed by feature name.
///
/// Serializes as a flat JSON object. Built per request and dropped once the
/// response has been produced.
///
/// ```rust
/// # use appraise::EmployeeRecord;
/// let record = EmployeeRecord::new()
///     .with("Age", 30)
///     .with("Gender", "Male");
/// assert_eq!(record.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeRecord {
    fields: BTreeMap<String, FeatureValue>,
}

impl EmployeeRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FeatureValue>,
    ) -> Option<FeatureValue> {
        self.fields.insert(name.into(), value.into())
    }

    /// Remove a field.
    pub fn remove(&mut self, name: &str) -> Option<FeatureValue> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for EmployeeRecord
where
    K: Into<String>,
    V: Into<FeatureValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_flat_object() {
        let record: EmployeeRecord =
            serde_json::from_str(r#"{"Age": 30, "Gender": "Male", "Hike": 12.5}"#).unwrap();
        assert_eq!(record.get("Age"), Some(&FeatureValue::Number(30.0)));
        assert_eq!(record.get("Gender"), Some(&FeatureValue::from("Male")));
        assert_eq!(record.get("Hike"), Some(&FeatureValue::Number(12.5)));
    }

    #[test]
    fn keeps_non_scalar_values_for_validation() {
        let record: EmployeeRecord =
            serde_json::from_str(r#"{"Age": null, "Gender": true, "Tags": [1]}"#).unwrap();
        assert_eq!(
            record.get("Age"),
            Some(&FeatureValue::Other(serde_json::Value::Null))
        );
        assert_eq!(
            record.get("Gender"),
            Some(&FeatureValue::Other(serde_json::Value::Bool(true)))
        );
        assert_eq!(record.get("Tags").unwrap().to_string(), "[1]");
    }

    #[test]
    fn from_json_value_prefers_scalars() {
        assert_eq!(
            FeatureValue::from(serde_json::json!(4)),
            FeatureValue::Number(4.0)
        );
        assert_eq!(
            FeatureValue::from(serde_json::json!("Sales")),
            FeatureValue::from("Sales")
        );
        assert_eq!(
            FeatureValue::from(serde_json::json!({"a": 1})),
            FeatureValue::Other(serde_json::json!({"a": 1}))
        );
    }

    #[test]
    fn insert_replaces_existing() {
        let mut record = EmployeeRecord::new().with("Age", 30);
        let previous = record.insert("Age", 31);
        assert_eq!(previous, Some(FeatureValue::Number(30.0)));
        assert_eq!(record.len(), 1);
    }
}
