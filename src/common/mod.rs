//! Shared utilities that glue the different domains together.
pub mod config;
pub mod error;
pub mod log;

pub use config::{AppCfg, PageCfg};
pub use error::{DashError, DashResult, ErrorClass, ErrorCode, FieldError};
