//! Built-in classification pipeline: feature encoding followed by an
//! estimator.
//!
//! Numeric features are standardized (`(x - mean) / scale`), categorical
//! features are one-hot encoded over their declared categories. The encoded
//! vector lists the features in schema order. Two estimators are provided:
//!
//! - [`Estimator::Linear`]: multinomial linear model with a softmax, exposes
//!   class probabilities;
//! - [`Estimator::Tree`]: binary decision tree over the encoded vector,
//!   reports a label only.

use std::sync::Arc;

use crate::contract::{ValidatedRecord, ValidatedValue};
use crate::error::BoxError;
use crate::types::{ClassDistribution, FeatureKind, FeatureSchema, Label};

use super::Classifier;

/// Faults raised while running the pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineFault {
    #[error("expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("feature #{index} has the wrong type for its encoder")]
    TypeMismatch { index: usize },

    #[error("category {value:?} was not seen by the encoder")]
    UnseenCategory { value: String },

    #[error("estimator produced a non-finite score")]
    NonFiniteScore,

    #[error("decision tree did not reach a leaf")]
    UnterminatedTree,
}

/// Per-feature encoding step.
#[derive(Debug, Clone, PartialEq)]
pub enum Encoder {
    Standardize { mean: f64, scale: f64 },
    OneHot { categories: Vec<String> },
}

impl Encoder {
    /// Number of encoded columns this step produces.
    pub fn width(&self) -> usize {
        match self {
            Self::Standardize { .. } => 1,
            Self::OneHot { categories } => categories.len(),
        }
    }
}

/// Node of a decision tree. Splits send `x[feature] <= threshold` left.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: Label,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Estimator {
    Linear {
        intercepts: Vec<f64>,
        coefficients: Vec<Vec<f64>>,
    },
    Tree {
        nodes: Vec<TreeNode>,
    },
}

/// Encoder + estimator pipeline bound to a feature schema.
#[derive(Debug)]
pub struct Pipeline {
    name: String,
    classes: Vec<Label>,
    schema: Arc<FeatureSchema>,
    encoders: Vec<Encoder>,
    estimator: Estimator,
    width: usize,
}

impl Pipeline {
    /// Assemble a pipeline, checking that all parts agree on dimensions.
    ///
    /// Returns a description of the first inconsistency found.
    pub fn new(
        name: impl Into<String>,
        classes: Vec<Label>,
        schema: FeatureSchema,
        encoders: Vec<Encoder>,
        estimator: Estimator,
    ) -> Result<Self, String> {
        if classes.is_empty() {
            return Err("model declares no classes".to_string());
        }
        for (i, class) in classes.iter().enumerate() {
            if classes[..i].contains(class) {
                return Err(format!("class {class} is declared twice"));
            }
        }
        if encoders.len() != schema.len() {
            return Err(format!(
                "{} encoders for {} features",
                encoders.len(),
                schema.len()
            ));
        }
        for (spec, encoder) in schema.features().iter().zip(&encoders) {
            match (&spec.kind, encoder) {
                (FeatureKind::Numeric { .. }, Encoder::Standardize { mean, scale }) => {
                    if !mean.is_finite() || !scale.is_finite() || *scale <= 0.0 {
                        return Err(format!(
                            "feature '{}' has invalid scaling (mean {mean}, scale {scale})",
                            spec.name
                        ));
                    }
                }
                (FeatureKind::Categorical { categories }, Encoder::OneHot { categories: known }) => {
                    if categories != known {
                        return Err(format!(
                            "feature '{}' encoder categories differ from its domain",
                            spec.name
                        ));
                    }
                }
                _ => {
                    return Err(format!(
                        "feature '{}' has an encoder of the wrong kind",
                        spec.name
                    ));
                }
            }
        }
        let width = encoders.iter().map(Encoder::width).sum();

        match &estimator {
            Estimator::Linear {
                intercepts,
                coefficients,
            } => {
                if intercepts.len() != classes.len() || coefficients.len() != classes.len() {
                    return Err(format!(
                        "linear estimator needs one intercept and one coefficient row per class ({})",
                        classes.len()
                    ));
                }
                if let Some(row) = coefficients.iter().find(|row| row.len() != width) {
                    return Err(format!(
                        "coefficient row has {} entries, encoded width is {width}",
                        row.len()
                    ));
                }
                let all_finite = intercepts
                    .iter()
                    .chain(coefficients.iter().flatten())
                    .all(|v| v.is_finite());
                if !all_finite {
                    return Err("linear estimator has non-finite weights".to_string());
                }
            }
            Estimator::Tree { nodes } => {
                if nodes.is_empty() {
                    return Err("decision tree has no nodes".to_string());
                }
                for (index, node) in nodes.iter().enumerate() {
                    match node {
                        TreeNode::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        } => {
                            if *feature >= width {
                                return Err(format!(
                                    "node {index} splits on column {feature}, encoded width is {width}"
                                ));
                            }
                            if !threshold.is_finite() {
                                return Err(format!("node {index} has a non-finite threshold"));
                            }
                            if *left >= nodes.len() || *right >= nodes.len() {
                                return Err(format!("node {index} points past the last node"));
                            }
                        }
                        TreeNode::Leaf { class } => {
                            if !classes.contains(class) {
                                return Err(format!(
                                    "node {index} predicts undeclared class {class}"
                                ));
                            }
                        }
                    }
                }
            }
        }

        Ok(Self {
            name: name.into(),
            classes,
            schema: Arc::new(schema),
            encoders,
            estimator,
            width,
        })
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    /// Width of the encoded feature vector.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Encode a record into the dense vector the estimator consumes.
    pub fn encode(&self, record: &ValidatedRecord) -> Result<Vec<f64>, PipelineFault> {
        if record.len() != self.encoders.len() {
            return Err(PipelineFault::ShapeMismatch {
                expected: self.encoders.len(),
                actual: record.len(),
            });
        }
        let mut encoded = Vec::with_capacity(self.width);
        for (index, (encoder, value)) in self.encoders.iter().zip(record.values()).enumerate() {
            match (encoder, value) {
                (Encoder::Standardize { mean, scale }, ValidatedValue::Numeric(x)) => {
                    encoded.push((x - mean) / scale);
                }
                (Encoder::OneHot { categories }, ValidatedValue::Category(value)) => {
                    let hot = categories.iter().position(|c| c == value).ok_or_else(|| {
                        PipelineFault::UnseenCategory {
                            value: value.clone(),
                        }
                    })?;
                    encoded.extend((0..categories.len()).map(|i| if i == hot { 1.0 } else { 0.0 }));
                }
                _ => return Err(PipelineFault::TypeMismatch { index }),
            }
        }
        Ok(encoded)
    }

    fn linear_distribution(
        &self,
        x: &[f64],
        intercepts: &[f64],
        coefficients: &[Vec<f64>],
    ) -> Result<(Label, ClassDistribution), PipelineFault> {
        let scores: Vec<f64> = intercepts
            .iter()
            .zip(coefficients)
            .map(|(b, w)| b + w.iter().zip(x).map(|(wi, xi)| wi * xi).sum::<f64>())
            .collect();
        let probabilities = softmax(&scores)?;

        // Ties resolve to the first declared class.
        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate() {
            if *p > probabilities[best] {
                best = i;
            }
        }
        let distribution = self
            .classes
            .iter()
            .copied()
            .zip(probabilities)
            .collect();
        Ok((self.classes[best], distribution))
    }

    fn walk_tree(&self, x: &[f64], nodes: &[TreeNode]) -> Result<Label, PipelineFault> {
        let mut index = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..nodes.len() {
            match &nodes[index] {
                TreeNode::Leaf { class } => return Ok(*class),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
        Err(PipelineFault::UnterminatedTree)
    }
}

impl Classifier for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn classes(&self) -> &[Label] {
        &self.classes
    }

    fn classify(&self, record: &ValidatedRecord) -> Result<Label, BoxError> {
        let x = self.encode(record)?;
        match &self.estimator {
            Estimator::Linear {
                intercepts,
                coefficients,
            } => Ok(self.linear_distribution(&x, intercepts, coefficients)?.0),
            Estimator::Tree { nodes } => Ok(self.walk_tree(&x, nodes)?),
        }
    }

    fn exposes_probabilities(&self) -> bool {
        matches!(self.estimator, Estimator::Linear { .. })
    }

    fn classify_with_confidence(
        &self,
        record: &ValidatedRecord,
    ) -> Result<(Label, ClassDistribution), BoxError> {
        match &self.estimator {
            Estimator::Linear {
                intercepts,
                coefficients,
            } => {
                let x = self.encode(record)?;
                Ok(self.linear_distribution(&x, intercepts, coefficients)?)
            }
            Estimator::Tree { .. } => Err(Box::new(crate::AppraiseError::NotImplemented(
                "classify_with_confidence",
            ))),
        }
    }
}

/// Numerically stable softmax.
fn softmax(scores: &[f64]) -> Result<Vec<f64>, PipelineFault> {
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(PipelineFault::NonFiniteScore);
    }
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    Ok(exps.into_iter().map(|e| e / total).collect())
}
