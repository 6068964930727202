//! Error types for reading and writing blotter files.

use blotter::PipelineError;
use thiserror::Error;

/// Errors at the file boundary.
#[derive(Debug, Error)]
pub enum IoError {
    /// CSV parsing or serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required column is absent from the input header.
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    /// A row handed to the writer is not in output shape.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Result type alias for file operations.
pub type Result<T> = std::result::Result<T, IoError>;
