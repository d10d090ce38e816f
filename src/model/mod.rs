//! Model domain: the classifier contract and the artefact it is loaded from.

pub mod domain;
pub mod repo_fs;
pub mod service;

pub use domain::{Classifier, ModelArtifact, ModelKind};
pub use repo_fs::{FsModelRepo, ModelRepo};
pub use service::LoadedModel;
