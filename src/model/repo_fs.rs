//! Filesystem repository for the classifier artefact.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::common::config::AppCfg;
use crate::common::error::{DashError, DashResult};

use super::domain::{Classifier, ModelArtifact};
use super::service::LoadedModel;

/// Repository contract for model artefacts.
pub trait ModelRepo {
    fn load_model(&self) -> DashResult<LoadedModel>;
}

/// Loads a JSON artefact from a single file.
pub struct FsModelRepo {
    path: PathBuf,
}

impl FsModelRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self::at(&cfg.model_path)
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ModelRepo for FsModelRepo {
    fn load_model(&self) -> DashResult<LoadedModel> {
        let raw = fs::read_to_string(&self.path).map_err(|err| DashError::io(&self.path, err))?;
        let artifact = ModelArtifact::from_json(&raw).map_err(|err| match err {
            DashError::Model(msg) => DashError::model(format!("{}: {msg}", self.path.display())),
            other => other,
        })?;
        let model = LoadedModel::new(artifact)?;
        info!(
            model = %self.path.display(),
            model_id = model.model_id(),
            version = model.version(),
            kind = model.kind().as_str(),
            features = model.n_features(),
            "loaded classifier"
        );
        Ok(model)
    }
}
