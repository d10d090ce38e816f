//! Error handling primitives shared across the core.
//!
//! Every failure maps to a stable [`ErrorCode`] and to one of three classes:
//! startup failures abort the process, validation failures are shown inline
//! next to the offending field, request failures abort a single prediction.

use std::path::PathBuf;

use thiserror::Error;

/// Stable error codes surfaced through the JSON API.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Reading a file from disk failed.
    Io = 1,
    /// Reference dataset is malformed or unusable.
    Dataset = 2,
    /// Reference dataset has no record of the positive class.
    NoPositiveRecord = 3,
    /// Classifier artefact is missing or malformed.
    Model = 4,
    /// Classifier and dataset disagree on the feature catalog.
    CatalogMismatch = 5,
    /// User input failed validation.
    InvalidInput = 6,
    /// Assembled vector does not match the classifier input shape.
    ShapeMismatch = 7,
    /// Configuration could not be loaded or is out of range.
    Config = 8,
    /// Catch-all for bugs.
    Internal = 9,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Io => "io",
            ErrorCode::Dataset => "dataset",
            ErrorCode::NoPositiveRecord => "no_positive_record",
            ErrorCode::Model => "model",
            ErrorCode::CatalogMismatch => "catalog_mismatch",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::ShapeMismatch => "shape_mismatch",
            ErrorCode::Config => "config",
            ErrorCode::Internal => "internal",
        }
    }
}

/// Where in the lifecycle an error is reported.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// Fatal, the dashboard cannot start.
    Startup,
    /// Bad user input; no prediction is attempted.
    Validation,
    /// A single prediction failed.
    Request,
}

/// A rejected input field and the reason it was rejected.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldError {
    pub feature: String,
    pub message: String,
}

impl FieldError {
    pub fn new(feature: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            message: message.into(),
        }
    }
}

/// Canonical error type for the core.
#[derive(Debug, Error)]
pub enum DashError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset {path}: {reason}")]
    Dataset { path: PathBuf, reason: String },

    #[error("dataset {path} has no label column `{column}`")]
    MissingLabelColumn { path: PathBuf, column: String },

    #[error("dataset {path} has no record with {column} = {positive}")]
    NoPositiveRecord {
        path: PathBuf,
        column: String,
        positive: f64,
    },

    #[error("default value for `{feature}` is not numeric: {raw:?}")]
    InvalidDefault { feature: String, raw: String },

    #[error("invalid feature catalog: {0}")]
    InvalidCatalog(String),

    #[error("model artefact: {0}")]
    Model(String),

    #[error("model expects features {expected:?} but dataset provides {actual:?}")]
    CatalogMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("invalid input: {}", summarize(.0))]
    InvalidInput(Vec<FieldError>),

    #[error("classifier expects {expected} features, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("config: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used throughout the crate.
pub type DashResult<T> = Result<T, DashError>;

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.feature, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl DashError {
    /// Validation helper for a single bad field.
    pub fn invalid(feature: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput(vec![FieldError::new(feature, message)])
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Machine parsable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DashError::Io { .. } => ErrorCode::Io,
            DashError::Dataset { .. }
            | DashError::MissingLabelColumn { .. }
            | DashError::InvalidDefault { .. }
            | DashError::InvalidCatalog(_) => ErrorCode::Dataset,
            DashError::NoPositiveRecord { .. } => ErrorCode::NoPositiveRecord,
            DashError::Model(_) => ErrorCode::Model,
            DashError::CatalogMismatch { .. } => ErrorCode::CatalogMismatch,
            DashError::InvalidInput(_) => ErrorCode::InvalidInput,
            DashError::ShapeMismatch { .. } => ErrorCode::ShapeMismatch,
            DashError::Config(_) => ErrorCode::Config,
            DashError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            DashError::InvalidInput(_) => ErrorClass::Validation,
            DashError::ShapeMismatch { .. } | DashError::Internal(_) => ErrorClass::Request,
            _ => ErrorClass::Startup,
        }
    }

    /// Per-field messages when this is a validation failure.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            DashError::InvalidInput(fields) => fields,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::Io as u32, 1);
        assert_eq!(ErrorCode::Dataset as u32, 2);
        assert_eq!(ErrorCode::NoPositiveRecord as u32, 3);
        assert_eq!(ErrorCode::Model as u32, 4);
        assert_eq!(ErrorCode::CatalogMismatch as u32, 5);
        assert_eq!(ErrorCode::InvalidInput as u32, 6);
        assert_eq!(ErrorCode::ShapeMismatch as u32, 7);
        assert_eq!(ErrorCode::Config as u32, 8);
        assert_eq!(ErrorCode::Internal as u32, 9);
    }

    #[test]
    fn classes_follow_taxonomy() {
        assert_eq!(
            DashError::invalid("HR", "not a number").class(),
            ErrorClass::Validation
        );
        assert_eq!(
            DashError::ShapeMismatch {
                expected: 3,
                got: 2
            }
            .class(),
            ErrorClass::Request
        );
        assert_eq!(DashError::model("missing").class(), ErrorClass::Startup);
    }

    #[test]
    fn invalid_input_lists_every_field() {
        let err = DashError::InvalidInput(vec![
            FieldError::new("HR", "not a number"),
            FieldError::new("Temp", "must be finite"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid input: HR: not a number; Temp: must be finite"
        );
        assert_eq!(err.field_errors().len(), 2);
        assert_eq!(err.code().as_str(), "invalid_input");
    }
}
