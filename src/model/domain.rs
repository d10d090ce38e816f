//! Classifier contract and the serialized model artefact.
//!
//! The artefact is a JSON document tagged by `kind`:
//!
//! ```json
//! {
//!   "model_id": "sepsis-lr",
//!   "version": "2024-06",
//!   "feature_names": ["HR", "Temp"],
//!   "kind": "logistic",
//!   "weights": [0.04, 0.9],
//!   "bias": -40.0,
//!   "scaler": { "mean": [85.0, 37.0], "scale": [15.0, 0.8] }
//! }
//! ```
//!
//! Tree ensembles use `"kind": "gradient_boosting"` with `base_score` and a
//! list of `trees`, each a flat node array rooted at index 0.
//!
//! TODO: XGBoost `binary:logistic` dumps store `base_score` as a probability,
//! not a margin; convert it on load so those dumps can be used unedited.

use serde::{Deserialize, Serialize};

use crate::common::error::{DashError, DashResult};
use crate::inference::domain::{DecisionThreshold, Label};

/// Supported model families.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Logistic,
    GradientBoosting,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Logistic => "logistic",
            ModelKind::GradientBoosting => "gradient_boosting",
        }
    }
}

/// A pretrained binary classifier over a fixed-order numeric vector.
pub trait Classifier: Send + Sync {
    fn kind(&self) -> ModelKind;

    fn model_id(&self) -> &str;

    /// Length of the input vector the model was trained on.
    fn n_features(&self) -> usize;

    /// Training-time feature order, when the artefact records it.
    fn feature_names(&self) -> Option<&[String]>;

    /// Probability of the positive class. Rejects vectors whose length
    /// differs from [`Classifier::n_features`].
    fn predict_proba(&self, features: &[f64]) -> DashResult<f64>;

    fn predict(&self, features: &[f64], threshold: DecisionThreshold) -> DashResult<Label> {
        self.predict_proba(features)
            .map(|probability| threshold.label_for(probability))
    }
}

/// Shape guard shared by classifier implementations.
pub fn ensure_shape(expected: usize, got: usize) -> DashResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(DashError::ShapeMismatch { expected, got })
    }
}

/// Serialized model artefact.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model_id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub feature_names: Vec<String>,
    #[serde(flatten)]
    pub body: ModelBody,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelBody {
    Logistic(LogisticParams),
    GradientBoosting(TreeEnsemble),
}

/// `p = sigmoid(bias + Σ wᵢ·(xᵢ − meanᵢ)/scaleᵢ)`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogisticParams {
    pub weights: Vec<f64>,
    pub bias: f64,
    #[serde(default)]
    pub scaler: Option<Scaler>,
}

/// Standardisation applied before the linear term.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// `p = sigmoid(base_score + Σ leaf)` over binary regression trees.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

/// `x[feature] < threshold` descends left.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl ModelArtifact {
    /// Parse and validate an artefact.
    pub fn from_json(json: &str) -> DashResult<Self> {
        let artifact: Self = serde_json::from_str(json)
            .map_err(|err| DashError::model(format!("invalid JSON: {err}")))?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn kind(&self) -> ModelKind {
        match self.body {
            ModelBody::Logistic(_) => ModelKind::Logistic,
            ModelBody::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    pub fn n_features(&self) -> usize {
        match &self.body {
            ModelBody::Logistic(params) => params.weights.len(),
            ModelBody::GradientBoosting(_) => self.feature_names.len(),
        }
    }

    /// Structural checks; a validated artefact can be scored without panics.
    pub fn validate(&self) -> DashResult<()> {
        if self.model_id.trim().is_empty() {
            return Err(DashError::model("model_id must not be empty"));
        }
        match &self.body {
            ModelBody::Logistic(params) => self.validate_logistic(params),
            ModelBody::GradientBoosting(ensemble) => self.validate_ensemble(ensemble),
        }
    }

    fn validate_logistic(&self, params: &LogisticParams) -> DashResult<()> {
        let n = params.weights.len();
        if n == 0 {
            return Err(DashError::model("logistic model has no weights"));
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != n {
            return Err(DashError::model(format!(
                "{} feature names for {n} weights",
                self.feature_names.len()
            )));
        }
        if let Some(pos) = params.weights.iter().position(|w| !w.is_finite()) {
            return Err(DashError::model(format!("non-finite weight at index {pos}")));
        }
        if !params.bias.is_finite() {
            return Err(DashError::model("non-finite bias"));
        }
        if let Some(scaler) = &params.scaler {
            if scaler.mean.len() != n || scaler.scale.len() != n {
                return Err(DashError::model(format!(
                    "scaler has {} means and {} scales for {n} weights",
                    scaler.mean.len(),
                    scaler.scale.len()
                )));
            }
            if scaler.mean.iter().any(|m| !m.is_finite()) {
                return Err(DashError::model("non-finite scaler mean"));
            }
            if scaler.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
                return Err(DashError::model("scaler scales must be finite and positive"));
            }
        }
        Ok(())
    }

    fn validate_ensemble(&self, ensemble: &TreeEnsemble) -> DashResult<()> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err(DashError::model(
                "gradient_boosting model must list feature_names",
            ));
        }
        if !ensemble.base_score.is_finite() {
            return Err(DashError::model("non-finite base_score"));
        }
        if ensemble.trees.is_empty() {
            return Err(DashError::model("gradient_boosting model has no trees"));
        }
        for (t, tree) in ensemble.trees.iter().enumerate() {
            let len = tree.nodes.len();
            if len == 0 {
                return Err(DashError::model(format!("tree {t} has no nodes")));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match *node {
                    Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if feature >= n {
                            return Err(DashError::model(format!(
                                "tree {t} node {i} splits on feature {feature} of {n}"
                            )));
                        }
                        if !threshold.is_finite() {
                            return Err(DashError::model(format!(
                                "tree {t} node {i} has a non-finite threshold"
                            )));
                        }
                        // Children after their parent keeps every walk finite.
                        for child in [left, right] {
                            if child <= i || child >= len {
                                return Err(DashError::model(format!(
                                    "tree {t} node {i} has invalid child {child}"
                                )));
                            }
                        }
                    }
                    Node::Leaf { value } => {
                        if !value.is_finite() {
                            return Err(DashError::model(format!(
                                "tree {t} node {i} has a non-finite leaf"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
