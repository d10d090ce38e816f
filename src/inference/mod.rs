//! Inference domain: assemble a feature vector and classify it.

pub mod domain;
pub mod service;

pub use domain::{DecisionThreshold, FeatureOverrides, FeatureVector, Label, Prediction};
pub use service::{assemble, classify, Outcome, RequestAssembler};
