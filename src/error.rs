//! Error types for the goal engine

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while computing or committing weekly goals
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No target status for admission {admission} between {from} and {to}")]
    MissingPriorStatus {
        admission: String,
        from: NaiveDate,
        to: NaiveDate,
    },

    #[error("Admission not found: {0}")]
    AdmissionNotFound(String),

    #[error("Data access error: {0}")]
    DataAccess(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),
}
