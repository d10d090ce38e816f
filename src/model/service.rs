//! Scoring for validated model artefacts.

use crate::common::error::{DashError, DashResult};

use super::domain::{
    ensure_shape, Classifier, LogisticParams, ModelArtifact, ModelBody, ModelKind, Node, Tree,
    TreeEnsemble,
};

/// A validated artefact ready to score.
#[derive(Clone, Debug)]
pub struct LoadedModel {
    artifact: ModelArtifact,
}

impl LoadedModel {
    pub fn new(artifact: ModelArtifact) -> DashResult<Self> {
        artifact.validate()?;
        Ok(Self { artifact })
    }

    pub fn from_json(json: &str) -> DashResult<Self> {
        ModelArtifact::from_json(json).map(|artifact| Self { artifact })
    }

    pub fn version(&self) -> &str {
        &self.artifact.version
    }
}

impl Classifier for LoadedModel {
    fn kind(&self) -> ModelKind {
        self.artifact.kind()
    }

    fn model_id(&self) -> &str {
        &self.artifact.model_id
    }

    fn n_features(&self) -> usize {
        self.artifact.n_features()
    }

    fn feature_names(&self) -> Option<&[String]> {
        if self.artifact.feature_names.is_empty() {
            None
        } else {
            Some(&self.artifact.feature_names)
        }
    }

    fn predict_proba(&self, features: &[f64]) -> DashResult<f64> {
        ensure_shape(self.n_features(), features.len())?;
        let margin = match &self.artifact.body {
            ModelBody::Logistic(params) => logistic_margin(params, features),
            ModelBody::GradientBoosting(ensemble) => ensemble_margin(ensemble, features)?,
        };
        Ok(sigmoid(margin))
    }
}

fn logistic_margin(params: &LogisticParams, x: &[f64]) -> f64 {
    // Bounded terms keep the sum finite, so opposing overflows cannot make NaN.
    let bound = f64::MAX / (x.len() as f64 + 2.0);
    let term = |wi: f64, centred: f64, scale: f64| -> f64 {
        if wi == 0.0 {
            return 0.0;
        }
        (wi * centred / scale).clamp(-bound, bound)
    };
    let linear: f64 = match &params.scaler {
        Some(scaler) => x
            .iter()
            .zip(&params.weights)
            .zip(scaler.mean.iter().zip(&scaler.scale))
            .map(|((xi, wi), (mean, scale))| term(*wi, xi - mean, *scale))
            .sum(),
        None => x
            .iter()
            .zip(&params.weights)
            .map(|(xi, wi)| term(*wi, *xi, 1.0))
            .sum(),
    };
    params.bias + linear
}

fn ensemble_margin(ensemble: &TreeEnsemble, x: &[f64]) -> DashResult<f64> {
    ensemble
        .trees
        .iter()
        .try_fold(ensemble.base_score, |acc, tree| {
            leaf_value(tree, x).map(|value| acc + value)
        })
}

fn leaf_value(tree: &Tree, x: &[f64]) -> DashResult<f64> {
    let mut idx = 0;
    loop {
        match tree.nodes.get(idx) {
            Some(Node::Leaf { value }) => return Ok(*value),
            Some(Node::Split {
                feature,
                threshold,
                left,
                right,
            }) => {
                let value = x
                    .get(*feature)
                    .ok_or_else(|| DashError::internal(format!("split on missing feature {feature}")))?;
                idx = if *value < *threshold { *left } else { *right };
            }
            None => return Err(DashError::internal(format!("tree node {idx} out of range"))),
        }
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}
