//! Feature schema types.
//!
//! A [`FeatureSchema`] is the ordered set of named, typed inputs a model
//! expects. Schemas are checked on construction and have no mutating API, so
//! once one is bound to a loaded model it stays fixed for the model's life.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{AppraiseError, Result};

/// Semantic type and domain constraint of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureKind {
    /// Bounded number, inclusive on both ends.
    Numeric {
        min: f64,
        max: f64,
        #[serde(default)]
        integer: bool,
    },
    /// Closed enumeration of string values.
    Categorical { categories: Vec<String> },
}

/// A named feature with its domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: FeatureKind,
}

impl FeatureSpec {
    /// Real-valued feature in `[min, max]`.
    pub fn numeric(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Numeric {
                min,
                max,
                integer: false,
            },
        }
    }

    /// Integer-valued feature in `[min, max]`.
    pub fn integer(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Numeric {
                min: min as f64,
                max: max as f64,
                integer: true,
            },
        }
    }

    /// Categorical feature over a closed set of values.
    pub fn categorical<I, S>(name: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: FeatureKind::Categorical {
                categories: categories.into_iter().map(Into::into).collect(),
            },
        }
    }

    fn check(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(AppraiseError::InvalidSchema(
                "feature name must not be empty".to_string(),
            ));
        }
        match &self.kind {
            FeatureKind::Numeric { min, max, .. } => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(AppraiseError::InvalidSchema(format!(
                        "feature '{}' has non-finite bounds",
                        self.name
                    )));
                }
                if min > max {
                    return Err(AppraiseError::InvalidSchema(format!(
                        "feature '{}' has min {min} greater than max {max}",
                        self.name
                    )));
                }
            }
            FeatureKind::Categorical { categories } => {
                if categories.is_empty() {
                    return Err(AppraiseError::InvalidSchema(format!(
                        "feature '{}' declares no categories",
                        self.name
                    )));
                }
                let mut seen = HashSet::new();
                for category in categories {
                    if !seen.insert(category.as_str()) {
                        return Err(AppraiseError::InvalidSchema(format!(
                            "feature '{}' repeats category {category:?}",
                            self.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Ordered, immutable set of features a model expects.
///
/// ```rust
/// # use appraise::{FeatureSchema, FeatureSpec};
/// let schema = FeatureSchema::new(vec![
///     FeatureSpec::integer("Age", 18, 60),
///     FeatureSpec::categorical("Gender", ["Male", "Female"]),
/// ]).unwrap();
/// assert_eq!(schema.len(), 2);
/// assert!(schema.feature("Age").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FeatureSpec>", into = "Vec<FeatureSpec>")]
pub struct FeatureSchema {
    features: Vec<FeatureSpec>,
}

impl FeatureSchema {
    /// Build a schema, rejecting duplicate names and malformed domains.
    pub fn new(features: Vec<FeatureSpec>) -> Result<Self> {
        if features.is_empty() {
            return Err(AppraiseError::InvalidSchema(
                "schema declares no features".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for feature in &features {
            feature.check()?;
            if !names.insert(feature.name.as_str()) {
                return Err(AppraiseError::InvalidSchema(format!(
                    "duplicate feature '{}'",
                    feature.name
                )));
            }
        }
        Ok(Self { features })
    }

    /// Features in declaration order.
    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureSpec> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Position of a feature in declaration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl TryFrom<Vec<FeatureSpec>> for FeatureSchema {
    type Error = AppraiseError;

    fn try_from(features: Vec<FeatureSpec>) -> Result<Self> {
        Self::new(features)
    }
}

impl From<FeatureSchema> for Vec<FeatureSpec> {
    fn from(schema: FeatureSchema) -> Self {
        schema.features
    }
}
