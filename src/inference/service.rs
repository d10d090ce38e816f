//! Prediction request assembly: merge overrides over defaults, classify, threshold.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::common::error::{DashError, DashResult};
use crate::data::domain::{DefaultVector, FeatureCatalog, ReferenceRecord};
use crate::model::domain::Classifier;

use super::domain::{DecisionThreshold, FeatureOverrides, FeatureVector, Prediction};

/// Build the classifier input: for each catalog name in order, the override
/// if present, else the default.
pub fn assemble(
    catalog: &FeatureCatalog,
    defaults: &DefaultVector,
    overrides: &FeatureOverrides,
) -> DashResult<FeatureVector> {
    if defaults.as_slice().len() != catalog.len() {
        return Err(DashError::internal(format!(
            "default vector has {} values for {} features",
            defaults.as_slice().len(),
            catalog.len()
        )));
    }
    if let Some(extra) = overrides.names().find(|name| !catalog.contains(name)) {
        return Err(DashError::invalid(extra, "unknown feature"));
    }

    let values = catalog
        .iter()
        .zip(defaults.as_slice())
        .map(|(name, default)| overrides.get(name).unwrap_or(*default))
        .collect();
    Ok(FeatureVector::new(values))
}

/// Score `vector` and map the probability to a label.
pub fn classify(
    classifier: &dyn Classifier,
    vector: &FeatureVector,
    threshold: DecisionThreshold,
) -> DashResult<Prediction> {
    let probability = classifier.predict_proba(vector.as_slice())?;
    if !(0.0..=1.0).contains(&probability) {
        return Err(DashError::internal(format!(
            "classifier returned probability {probability} outside [0, 1]"
        )));
    }
    Ok(Prediction {
        label: threshold.label_for(probability),
        probability,
    })
}

/// Assembled input together with its prediction.
#[derive(Clone, Debug)]
pub struct Outcome {
    pub vector: FeatureVector,
    pub prediction: Prediction,
}

/// Read-only context loaded once at startup and shared by every request.
pub struct RequestAssembler {
    catalog: FeatureCatalog,
    defaults: DefaultVector,
    classifier: Arc<dyn Classifier>,
    threshold: DecisionThreshold,
}

impl RequestAssembler {
    /// Pair a reference record with a classifier. Fails when the classifier
    /// records a feature order that differs from the dataset's catalog.
    pub fn new(
        reference: ReferenceRecord,
        classifier: Arc<dyn Classifier>,
        threshold: DecisionThreshold,
    ) -> DashResult<Self> {
        let ReferenceRecord {
            catalog, defaults, ..
        } = reference;

        if let Some(expected) = classifier.feature_names() {
            if expected != catalog.names() {
                return Err(DashError::CatalogMismatch {
                    expected: expected.to_vec(),
                    actual: catalog.names().to_vec(),
                });
            }
        } else if classifier.n_features() != catalog.len() {
            warn!(
                model_id = classifier.model_id(),
                expected = classifier.n_features(),
                catalog = catalog.len(),
                "classifier input length differs from dataset catalog; predictions will fail"
            );
        }

        Ok(Self {
            catalog,
            defaults,
            classifier,
            threshold,
        })
    }

    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    pub fn defaults(&self) -> &DefaultVector {
        &self.defaults
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn threshold(&self) -> DecisionThreshold {
        self.threshold
    }

    pub fn assemble(&self, overrides: &FeatureOverrides) -> DashResult<FeatureVector> {
        assemble(&self.catalog, &self.defaults, overrides)
    }

    /// Assemble and classify one submission.
    pub fn predict(&self, overrides: &FeatureOverrides) -> DashResult<Outcome> {
        let start = Instant::now();
        let vector = self.assemble(overrides)?;
        let prediction = classify(self.classifier.as_ref(), &vector, self.threshold)?;
        debug!(
            model_id = self.classifier.model_id(),
            overrides = overrides.len(),
            label = prediction.label.as_str(),
            probability = prediction.probability,
            latency_us = start.elapsed().as_micros() as u64,
            "prediction"
        );
        Ok(Outcome { vector, prediction })
    }
}
