//! Error types for the export run.

use thiserror::Error;

/// Everything that can abort an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Strava error: {0}")]
    Strava(#[from] strava_client::StravaError),

    #[error("activity {activity:?} has no {field}")]
    MissingField { activity: String, field: &'static str },

    #[error("invalid activity: {0}")]
    InvalidActivity(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
