//! Core dataset definitions: the feature catalog and the default vector.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::common::error::{DashError, DashResult};

/// Ordered feature names as the classifier was trained on them.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureCatalog {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureCatalog {
    /// Build a catalog, rejecting an empty list and duplicate names.
    pub fn new(names: Vec<String>) -> DashResult<Self> {
        if names.is_empty() {
            return Err(DashError::InvalidCatalog("no feature columns".to_string()));
        }
        let mut index = HashMap::with_capacity(names.len());
        for (pos, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(DashError::InvalidCatalog(format!(
                    "column {pos} has an empty name"
                )));
            }
            if index.insert(name.clone(), pos).is_some() {
                return Err(DashError::InvalidCatalog(format!(
                    "duplicate feature `{name}`"
                )));
            }
        }
        Ok(Self { names, index })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Baseline values taken from one positive-class record, aligned with the catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct DefaultVector {
    values: Vec<f64>,
}

impl DefaultVector {
    /// Pair `values` with `catalog`; lengths must agree.
    pub fn new(catalog: &FeatureCatalog, values: Vec<f64>) -> DashResult<Self> {
        if values.len() != catalog.len() {
            return Err(DashError::InvalidCatalog(format!(
                "default row has {} values for {} features",
                values.len(),
                catalog.len()
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(DashError::InvalidDefault {
                feature: catalog.names()[pos].clone(),
                raw: values[pos].to_string(),
            });
        }
        Ok(Self { values })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Catalog and defaults read from the reference dataset.
#[derive(Clone, Debug)]
pub struct ReferenceRecord {
    pub source: PathBuf,
    pub catalog: FeatureCatalog,
    pub defaults: DefaultVector,
    /// 1-based data row the defaults were taken from.
    pub row: u64,
}

/// Repository contract for loading the reference record.
pub trait ReferenceRepo {
    fn load_reference(&self) -> DashResult<ReferenceRecord>;
}
