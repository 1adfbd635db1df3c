//! Persisted classifier artifact
//!
//! JSON document produced by the offline training job:
//!
//! ```json
//! {
//!   "threshold": 0.42,
//!   "feature_names": ["m_age", "prepregancy_bmi"],
//!   "feature_medians": {"m_age": 29.0, "prepregancy_bmi": 23.4},
//!   "model": {"kind": "random_forest", "trees": [[
//!       {"feature": 1, "threshold": 27.5, "left": 1, "right": 2},
//!       {"probability": 0.2},
//!       {"probability": 0.8}
//!   ]]}
//! }
//! ```
//!
//! Everything is validated at load, so a loaded artifact never indexes out of
//! bounds and never loops.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::finite;
use crate::types::thresholds::ml_constants::DEFAULT_THRESHOLD;

// ============================================================================
// Errors
// ============================================================================

/// The artifact could not be obtained. The pipeline degrades to rules only.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("cannot read model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed model artifact: {0}")]
    Malformed(String),
}

/// A single inference call failed. Recovered by the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("expected {expected} features, got {got}")]
    FeatureCount { expected: usize, got: usize },

    #[error("non-finite {0}")]
    NonFinite(String),

    #[error("feature '{0}' has no value and no imputation median")]
    MissingFeature(String),

    #[error("invalid model structure: {0}")]
    InvalidModel(String),
}

// ============================================================================
// Classifier seam
// ============================================================================

/// Anything that turns a feature vector into P(high risk).
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Length of the feature vector `predict_proba` expects.
    fn n_features(&self) -> usize;

    /// Probability of the positive (high-risk) class.
    fn predict_proba(&self, features: &[f64]) -> Result<f64, PredictionError>;
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn check_features(expected: usize, features: &[f64]) -> Result<(), PredictionError> {
    if features.len() != expected {
        return Err(PredictionError::FeatureCount {
            expected,
            got: features.len(),
        });
    }
    if let Some(i) = features.iter().position(|v| !v.is_finite()) {
        return Err(PredictionError::NonFinite(format!("input at feature {i}")));
    }
    Ok(())
}

/// `P = sigmoid(intercept + Σ cᵢxᵢ)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl Classifier for LogisticModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64, PredictionError> {
        check_features(self.n_features(), features)?;
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>();
        finite(sigmoid(z)).ok_or_else(|| PredictionError::NonFinite("logit".to_string()))
    }
}

/// One node of a flattened decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { probability: f64 },
}

/// Nodes in array order; the root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn leaf_probability(&self, features: &[f64]) -> Result<f64, PredictionError> {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { probability }) => return Ok(*probability),
                Some(TreeNode::Split { feature, threshold, left, right }) => {
                    let x = features.get(*feature).ok_or(PredictionError::FeatureCount {
                        expected: feature + 1,
                        got: features.len(),
                    })?;
                    let next = if *x <= *threshold { *left } else { *right };
                    if next <= index {
                        return Err(PredictionError::InvalidModel(format!("backward edge at node {index}")));
                    }
                    index = next;
                }
                None => {
                    return Err(PredictionError::InvalidModel(format!("no node {index}")));
                }
            }
        }
    }

    fn validate(&self, tree: usize, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("tree {tree} has no nodes"));
        }
        let n = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split { feature, threshold, left, right } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "tree {tree} node {i}: feature index {feature} out of range ({n_features} features)"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("tree {tree} node {i}: non-finite split threshold"));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= n {
                            return Err(format!(
                                "tree {tree} node {i}: child {child} must point forward within {n} nodes"
                            ));
                        }
                    }
                }
                TreeNode::Leaf { probability } => {
                    if !(0.0..=1.0).contains(probability) {
                        return Err(format!(
                            "tree {tree} node {i}: leaf probability {probability} outside [0, 1]"
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Mean of the leaf probabilities of every tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub trees: Vec<DecisionTree>,
    /// Feature vector length; taken from `feature_names` when loading a file.
    #[serde(skip)]
    pub n_features: usize,
}

impl Classifier for ForestModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64, PredictionError> {
        check_features(self.n_features, features)?;
        if self.trees.is_empty() {
            return Err(PredictionError::InvalidModel("empty forest".to_string()));
        }
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.leaf_probability(features)?;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = sum / self.trees.len() as f64;
        Ok(mean)
    }
}

/// Model section of the artifact file, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Logistic(LogisticModel),
    RandomForest(ForestModel),
}

impl ModelSpec {
    fn into_classifier(self, n_features: usize) -> Result<Arc<dyn Classifier>, String> {
        match self {
            Self::Logistic(model) => {
                if model.coefficients.len() != n_features {
                    return Err(format!(
                        "{} coefficients for {n_features} features",
                        model.coefficients.len()
                    ));
                }
                if !model.intercept.is_finite() || model.coefficients.iter().any(|c| !c.is_finite()) {
                    return Err("logistic parameters must be finite".to_string());
                }
                Ok(Arc::new(model))
            }
            Self::RandomForest(mut forest) => {
                if forest.trees.is_empty() {
                    return Err("random forest has no trees".to_string());
                }
                for (t, tree) in forest.trees.iter().enumerate() {
                    tree.validate(t, n_features)?;
                }
                forest.n_features = n_features;
                Ok(Arc::new(forest))
            }
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

/// On-disk layout of the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactFile {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub feature_medians: BTreeMap<String, f64>,
    pub model: ModelSpec,
}

// ============================================================================
// Loaded artifact
// ============================================================================

/// A validated classifier bundled with its decision threshold, feature order
/// and imputation medians. Read-only once built.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    classifier: Arc<dyn Classifier>,
    threshold: f64,
    feature_names: Vec<String>,
    feature_medians: BTreeMap<String, f64>,
}

impl ModelArtifact {
    /// Bundle an arbitrary classifier. Fails when the threshold is outside
    /// `[0, 1]` or the feature list does not match the classifier.
    pub fn new(
        classifier: Arc<dyn Classifier>,
        feature_names: Vec<String>,
        threshold: f64,
        feature_medians: BTreeMap<String, f64>,
    ) -> Result<Self, ArtifactError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ArtifactError::Malformed(format!(
                "threshold {threshold} outside [0, 1]"
            )));
        }
        if feature_names.is_empty() {
            return Err(ArtifactError::Malformed("feature_names is empty".to_string()));
        }
        if classifier.n_features() != feature_names.len() {
            return Err(ArtifactError::Malformed(format!(
                "classifier expects {} features but {} are named",
                classifier.n_features(),
                feature_names.len()
            )));
        }
        if let Some((name, _)) = feature_medians.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ArtifactError::Malformed(format!("non-finite median for '{name}'")));
        }
        Ok(Self {
            classifier,
            threshold,
            feature_names,
            feature_medians,
        })
    }

    pub fn from_file(file: ArtifactFile) -> Result<Self, ArtifactError> {
        let classifier = file
            .model
            .into_classifier(file.feature_names.len())
            .map_err(ArtifactError::Malformed)?;
        Self::new(classifier, file.feature_names, file.threshold, file.feature_medians)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ArtifactError> {
        let file: ArtifactFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    /// Read and validate an artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Precomputed imputation value for a feature, if the artifact has one.
    pub fn feature_median(&self, feature: &str) -> Option<f64> {
        self.feature_medians.get(feature).copied()
    }

    /// P(high risk) for a feature vector in `feature_names` order.
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64, PredictionError> {
        let p = self.classifier.predict_proba(features)?;
        finite(p)
            .map(|p| p.clamp(0.0, 1.0))
            .ok_or_else(|| PredictionError::NonFinite("probability".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOREST: &str = r#"{
        "threshold": 0.4,
        "feature_names": ["m_age", "prepregancy_bmi"],
        "feature_medians": {"m_age": 29.0},
        "model": {"kind": "random_forest", "trees": [
            [
                {"feature": 1, "threshold": 27.5, "left": 1, "right": 2},
                {"probability": 0.2},
                {"probability": 0.8}
            ],
            [
                {"feature": 0, "threshold": 35.0, "left": 1, "right": 2},
                {"probability": 0.1},
                {"probability": 0.9}
            ]
        ]}
    }"#;

    #[test]
    fn test_forest_artifact_loads_and_predicts() {
        let artifact = ModelArtifact::from_json_str(FOREST).expect("valid artifact");
        assert_eq!(artifact.threshold(), 0.4);
        assert_eq!(artifact.feature_names(), ["m_age", "prepregancy_bmi"]);
        assert_eq!(artifact.feature_median("m_age"), Some(29.0));
        assert_eq!(artifact.feature_median("prepregancy_bmi"), None);

        let low = artifact.predict_proba(&[30.0, 22.0]).unwrap();
        assert!((low - 0.15).abs() < 1e-12);
        let high = artifact.predict_proba(&[40.0, 30.0]).unwrap();
        assert!((high - 0.85).abs() < 1e-12);
        // split is inclusive on the left
        let edge = artifact.predict_proba(&[35.0, 27.5]).unwrap();
        assert!((edge - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_logistic_artifact_defaults_threshold() {
        let json = r#"{
            "feature_names": ["m_age", "prepregancy_bmi"],
            "model": {"kind": "logistic", "coefficients": [0.05, 0.08], "intercept": -3.5}
        }"#;
        let artifact = ModelArtifact::from_json_str(json).expect("valid artifact");
        assert_eq!(artifact.threshold(), 0.5);
        let p = artifact.predict_proba(&[30.0, 25.0]).unwrap();
        assert!((p - sigmoid(-3.5 + 1.5 + 2.0)).abs() < 1e-12);
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_prediction_rejects_wrong_width_and_nan() {
        let artifact = ModelArtifact::from_json_str(FOREST).unwrap();
        assert_eq!(
            artifact.predict_proba(&[30.0]),
            Err(PredictionError::FeatureCount { expected: 2, got: 1 })
        );
        assert!(matches!(
            artifact.predict_proba(&[f64::NAN, 20.0]),
            Err(PredictionError::NonFinite(_))
        ));
    }

    #[test]
    fn test_coefficient_count_mismatch_is_malformed() {
        let json = r#"{
            "feature_names": ["a", "b", "c"],
            "model": {"kind": "logistic", "coefficients": [1.0], "intercept": 0.0}
        }"#;
        assert!(matches!(
            ModelArtifact::from_json_str(json),
            Err(ArtifactError::Malformed(_))
        ));
    }

    #[test]
    fn test_backward_child_pointer_is_malformed() {
        let json = r#"{
            "feature_names": ["a"],
            "model": {"kind": "random_forest", "trees": [[
                {"feature": 0, "threshold": 1.0, "left": 0, "right": 1},
                {"probability": 0.5}
            ]]}
        }"#;
        let err = ModelArtifact::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("point forward"), "{err}");
    }

    #[test]
    fn test_bad_threshold_and_leaf_are_malformed() {
        let bad_threshold = r#"{
            "threshold": 1.5,
            "feature_names": ["a"],
            "model": {"kind": "logistic", "coefficients": [1.0], "intercept": 0.0}
        }"#;
        assert!(matches!(
            ModelArtifact::from_json_str(bad_threshold),
            Err(ArtifactError::Malformed(_))
        ));
        let bad_leaf = r#"{
            "feature_names": ["a"],
            "model": {"kind": "random_forest", "trees": [[{"probability": 1.2}]]}
        }"#;
        assert!(matches!(
            ModelArtifact::from_json_str(bad_leaf),
            Err(ArtifactError::Malformed(_))
        ));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(
            ModelArtifact::from_json_str("not json"),
            Err(ArtifactError::Parse(_))
        ));
        assert!(matches!(
            ModelArtifact::from_json_str(r#"{"feature_names": ["a"], "model": {"kind": "svm"}}"#),
            Err(ArtifactError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ModelArtifact::load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }
}
