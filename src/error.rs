//! Error types for the view engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving fields, evaluating conditions or
/// moving view configuration in and out of storage.
#[derive(Debug, Error)]
pub enum ViewError {
    /// A filter, sort or group references a field the registry does not know.
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    /// The same field id was registered twice.
    #[error("field '{field}' is registered more than once")]
    DuplicateField { field: String },

    /// A value could not be coerced to the type an operator needs.
    #[error("cannot compare '{value}' as {expected} for {operator} on field '{field}'")]
    Comparison {
        field: String,
        operator: String,
        value: String,
        expected: &'static str,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Record import failed.
    #[error("failed to load records from {path}: {reason}")]
    Load { path: PathBuf, reason: String },
}

impl ViewError {
    pub fn unknown_field(field: impl Into<String>) -> Self {
        ViewError::UnknownField {
            field: field.into(),
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, ViewError::Comparison { .. })
    }
}

pub type Result<T> = std::result::Result<T, ViewError>;
