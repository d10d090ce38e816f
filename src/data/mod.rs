//! Data domain: reference dataset, feature catalog and default vector.

pub mod domain;
pub mod repo_fs;
pub mod service;

pub use domain::{DefaultVector, FeatureCatalog, ReferenceRecord, ReferenceRepo};
pub use repo_fs::FsReferenceRepo;
pub use service::FeatureLayout;
