//! Runtime configuration loaded from an optional TOML file.
//!
//! Every field has a default so an empty file (or no file at all) yields a
//! working configuration pointing at `ProcessedDataset.csv` and `model.json`
//! in the current directory. The binary layers CLI flags on top and calls
//! [`AppCfg::validate`] once the merge is complete.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::error::{DashError, DashResult};
use crate::common::log::LogCfg;

/// Vitals shown first in the form, in display order.
pub const DEFAULT_KEY_VITALS: [&str; 13] = [
    "HR",
    "SBP",
    "MAP",
    "Resp",
    "Temp",
    "WBC",
    "Lactate",
    "Creatinine",
    "Platelets",
    "BUN",
    "Bilirubin_total",
    "FiO2",
    "O2Sat",
];

/// Snapshot of configuration values consumed by the dashboard.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppCfg {
    /// Reference dataset (CSV with header row).
    pub dataset_path: PathBuf,
    /// Serialized classifier artefact (JSON).
    pub model_path: PathBuf,
    /// Column holding the class label; every other column is a feature.
    pub label_column: String,
    /// Label value identifying the positive class.
    pub positive_class: f64,
    /// Probability strictly above this value is labelled positive.
    pub threshold: f64,
    pub key_vitals: Vec<String>,
    /// Listen address for the HTTP server.
    pub bind: String,
    pub page: PageCfg,
    pub log: LogCfg,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("ProcessedDataset.csv"),
            model_path: PathBuf::from("model.json"),
            label_column: "SepsisLabel".to_string(),
            positive_class: 1.0,
            threshold: 0.5,
            key_vitals: DEFAULT_KEY_VITALS.iter().map(|s| s.to_string()).collect(),
            bind: "127.0.0.1:8501".to_string(),
            page: PageCfg::default(),
            log: LogCfg::default(),
        }
    }
}

/// Captions rendered on the dashboard page.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PageCfg {
    pub title: String,
    pub intro: String,
    pub submit_caption: String,
    pub positive_caption: String,
    pub negative_caption: String,
}

impl Default for PageCfg {
    fn default() -> Self {
        Self {
            title: "Sepsis Detection Dashboard".to_string(),
            intro: "This dashboard uses a real septic patient example as the base. \
                    You can adjust the patient's values below and run a prediction."
                .to_string(),
            submit_caption: "Run Sepsis Prediction".to_string(),
            positive_caption: "Sepsis Detected!".to_string(),
            negative_caption: "No Sepsis Detected.".to_string(),
        }
    }
}

impl AppCfg {
    /// Load from `path` when given, otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> DashResult<Self> {
        match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|err| DashError::io(path, err))?;
                Self::from_toml_str(&raw)
                    .map_err(|err| DashError::config(format!("{}: {err}", path.display())))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(raw: &str) -> DashResult<Self> {
        toml::from_str(raw).map_err(|err| DashError::config(err.to_string()))
    }

    /// Check value ranges after every override has been applied.
    pub fn validate(&self) -> DashResult<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(DashError::config(format!(
                "threshold {} not in [0, 1]",
                self.threshold
            )));
        }
        if !self.positive_class.is_finite() {
            return Err(DashError::config("positive_class must be finite"));
        }
        if self.label_column.trim().is_empty() {
            return Err(DashError::config("label_column must not be empty"));
        }
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> DashResult<SocketAddr> {
        self.bind
            .parse()
            .map_err(|_| DashError::config(format!("invalid bind address {:?}", self.bind)))
    }
}
