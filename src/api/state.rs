//! Startup wiring: load dataset and model once into a shared read-only state.

use std::sync::Arc;

use tracing::info;

use crate::common::config::{AppCfg, PageCfg};
use crate::common::error::DashResult;
use crate::data::domain::{ReferenceRecord, ReferenceRepo};
use crate::data::repo_fs::FsReferenceRepo;
use crate::data::service::FeatureLayout;
use crate::inference::domain::DecisionThreshold;
use crate::inference::service::RequestAssembler;
use crate::model::domain::Classifier;
use crate::model::repo_fs::{FsModelRepo, ModelRepo};

/// Everything a request needs. Built once, never mutated.
pub struct AppState {
    pub assembler: RequestAssembler,
    pub layout: FeatureLayout,
    pub page: PageCfg,
}

impl AppState {
    /// Load the reference dataset and classifier named by `cfg`.
    pub fn load(cfg: &AppCfg) -> DashResult<Self> {
        let reference = FsReferenceRepo::new(cfg).load_reference()?;
        let model = FsModelRepo::new(cfg).load_model()?;
        Self::from_parts(reference, Arc::new(model), cfg)
    }

    pub fn from_parts(
        reference: ReferenceRecord,
        classifier: Arc<dyn Classifier>,
        cfg: &AppCfg,
    ) -> DashResult<Self> {
        let threshold = DecisionThreshold::new(cfg.threshold)?;
        let layout = FeatureLayout::build(&reference.catalog, &cfg.key_vitals);
        let source = reference.source.clone();
        let row = reference.row;
        let assembler = RequestAssembler::new(reference, classifier, threshold)?;
        info!(
            dataset = %source.display(),
            default_row = row,
            model_id = assembler.classifier().model_id(),
            features = assembler.catalog().len(),
            key_vitals = layout.vitals_left.len() + layout.vitals_right.len(),
            threshold = threshold.value(),
            "dashboard state ready"
        );
        Ok(Self {
            assembler,
            layout,
            page: cfg.page.clone(),
        })
    }
}
