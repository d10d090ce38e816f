//! Filesystem-backed reference dataset (CSV with one header row).

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::common::config::AppCfg;
use crate::common::error::{DashError, DashResult};

use super::domain::{DefaultVector, FeatureCatalog, ReferenceRecord, ReferenceRepo};

/// Reads the catalog from the header and the defaults from the first
/// record labelled with the positive class.
pub struct FsReferenceRepo {
    path: PathBuf,
    label_column: String,
    positive_class: f64,
}

impl FsReferenceRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self::with_label(&cfg.dataset_path, &cfg.label_column, cfg.positive_class)
    }

    pub fn with_label(
        path: impl Into<PathBuf>,
        label_column: impl Into<String>,
        positive_class: f64,
    ) -> Self {
        Self {
            path: path.into(),
            label_column: label_column.into(),
            positive_class,
        }
    }

    fn dataset_error(&self, reason: impl ToString) -> DashError {
        DashError::Dataset {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn read_from<R: Read>(&self, reader: R) -> DashResult<ReferenceRecord> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|err| self.dataset_error(err))?
            .clone();
        let label_pos = headers
            .iter()
            .position(|h| h == self.label_column)
            .ok_or_else(|| DashError::MissingLabelColumn {
                path: self.path.clone(),
                column: self.label_column.clone(),
            })?;

        let names = headers
            .iter()
            .enumerate()
            .filter(|(pos, _)| *pos != label_pos)
            .map(|(_, name)| name.to_string())
            .collect();
        let catalog = FeatureCatalog::new(names)?;

        let mut row = 0u64;
        for record in rdr.records() {
            let record = record.map_err(|err| self.dataset_error(err))?;
            row += 1;

            let raw_label = record.get(label_pos).unwrap_or_default();
            match raw_label.parse::<f64>() {
                Ok(label) if label == self.positive_class => {}
                Ok(_) => continue,
                Err(_) => {
                    debug!(row, label = raw_label, "skipping record with unparsable label");
                    continue;
                }
            }

            let values = record
                .iter()
                .zip(headers.iter())
                .enumerate()
                .filter(|(pos, _)| *pos != label_pos)
                .map(|(_, (raw, name))| parse_default(name, raw))
                .collect::<DashResult<Vec<_>>>()?;
            let defaults = DefaultVector::new(&catalog, values)?;

            info!(
                dataset = %self.path.display(),
                row,
                features = catalog.len(),
                "loaded reference record"
            );
            return Ok(ReferenceRecord {
                source: self.path.clone(),
                catalog,
                defaults,
                row,
            });
        }

        Err(DashError::NoPositiveRecord {
            path: self.path.clone(),
            column: self.label_column.clone(),
            positive: self.positive_class,
        })
    }
}

fn parse_default(feature: &str, raw: &str) -> DashResult<f64> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DashError::InvalidDefault {
            feature: feature.to_string(),
            raw: raw.to_string(),
        }),
    }
}

impl ReferenceRepo for FsReferenceRepo {
    fn load_reference(&self) -> DashResult<ReferenceRecord> {
        let file = File::open(&self.path).map_err(|err| DashError::io(&self.path, err))?;
        self.read_from(file)
    }
}
