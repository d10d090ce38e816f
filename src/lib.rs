// lib.rs - central orchestrator
pub mod api;
pub mod common;
pub mod data;
pub mod inference;
pub mod model;

pub use api::AppState;
pub use common::{AppCfg, DashError, DashResult};
pub use inference::{DecisionThreshold, FeatureOverrides, Label, Prediction, RequestAssembler};
