//! Domain definitions for prediction requests and results.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::common::error::{DashError, DashResult, FieldError};
use crate::data::domain::FeatureCatalog;

/// Binary outcome of a prediction.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Negative,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Positive => "positive",
            Label::Negative => "negative",
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Label::Positive)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability cutoff; strictly greater is positive.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct DecisionThreshold(f64);

impl DecisionThreshold {
    pub const DEFAULT: f64 = 0.5;

    pub fn new(value: f64) -> DashResult<Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DashError::config(format!("threshold {value} not in [0, 1]")))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn label_for(&self, probability: f64) -> Label {
        if probability > self.0 {
            Label::Positive
        } else {
            Label::Negative
        }
    }
}

impl Default for DecisionThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// User-edited values keyed by feature name. Names are checked against the
/// catalog on insertion, so every entry maps onto one catalog slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureOverrides {
    values: BTreeMap<String, f64>,
}

impl FeatureOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, catalog: &FeatureCatalog, name: &str, value: f64) -> DashResult<()> {
        if !catalog.contains(name) {
            return Err(DashError::invalid(name, "unknown feature"));
        }
        if !value.is_finite() {
            return Err(DashError::invalid(name, "must be a finite number"));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Parse raw text entries such as form fields. All bad fields are
    /// reported together.
    pub fn parse<'a, I>(catalog: &FeatureCatalog, entries: I) -> DashResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut overrides = Self::new();
        let mut errors = Vec::new();
        for (name, raw) in entries {
            let value = match parse_number(raw) {
                Some(value) => value,
                None => {
                    errors.push(FieldError::new(name, format!("{:?} is not a number", raw.trim())));
                    continue;
                }
            };
            if let Err(err) = overrides.insert(catalog, name, value) {
                errors.extend(err.field_errors().iter().cloned());
            }
        }
        if errors.is_empty() {
            Ok(overrides)
        } else {
            Err(DashError::InvalidInput(errors))
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Assembled classifier input in catalog order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub(crate) fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pair each value with its catalog name.
    pub fn named<'a>(
        &'a self,
        catalog: &'a FeatureCatalog,
    ) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        catalog.iter().zip(self.values.iter().copied())
    }
}

/// Label and positive-class probability for one submission.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    pub label: Label,
    pub probability: f64,
}

impl Prediction {
    /// Probability with two decimals, as displayed.
    pub fn probability_display(&self) -> String {
        format!("{:.2}", self.probability)
    }
}
