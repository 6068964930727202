//! Error types for pipeline operations.

use crate::dataset::RowIndex;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while running the blotter pipeline.
///
/// Every variant is fatal. A zero total fund value is not an error: it
/// surfaces as [`Return::NaN`](crate::Return::NaN) in the affected rows.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A cell could not be converted to its expected type
    #[error("Parse error at row {row}, column '{column}' (value {value:?}): {reason}")]
    Parse {
        /// Zero-based position of the row in the dataset
        row: usize,
        /// Column that failed to convert
        column: &'static str,
        /// Raw cell contents
        value: String,
        /// Why the conversion failed
        reason: String,
    },

    /// A stage replaced the dataset while running in place
    #[error(
        "Stage '{stage}' returned dataset {actual} instead of mutating dataset {expected} in place"
    )]
    ContractViolation {
        /// Stage that broke the contract
        stage: &'static str,
        /// Identity of the dataset handed to the stage
        expected: u64,
        /// Identity of the dataset the stage returned
        actual: u64,
    },

    /// A row was reached before a primary key was assigned to it
    #[error("Row has no row_index; primary key assignment must run first")]
    MissingRowIndex,

    /// A typed value was read from a column that is still raw text
    #[error("Column '{column}' of row {row} is not normalized yet")]
    NotNormalized {
        /// Row index of the offending row
        row: RowIndex,
        /// Column that is still raw
        column: &'static str,
    },

    /// A partition key column is empty
    #[error("Row {row} has no value for partition key '{column}'")]
    MissingKey {
        /// Row index of the offending row
        row: RowIndex,
        /// Key column with no value
        column: &'static str,
    },

    /// A partition result referenced a row that does not exist
    #[error("No row with row_index {0} to merge into")]
    UnknownRowIndex(RowIndex),

    /// Two rows share the same row_index
    #[error("Duplicate row_index {0}")]
    DuplicateRowIndex(RowIndex),

    /// Decimal arithmetic left the representable range
    #[error("Arithmetic overflow: {0}")]
    Arithmetic(String),

    /// Invalid pipeline configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_row_and_column() {
        let err = PipelineError::Parse {
            row: 7,
            column: "pal",
            value: "12,5".to_string(),
            reason: "invalid decimal".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("row 7"));
        assert!(msg.contains("'pal'"));
        assert!(msg.contains("12,5"));
    }

    #[test]
    fn test_contract_violation_format() {
        let err = PipelineError::ContractViolation {
            stage: "daily_aggregate",
            expected: 1,
            actual: 2,
        };
        assert!(err.to_string().contains("daily_aggregate"));
    }
}
