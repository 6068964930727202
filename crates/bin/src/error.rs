//! Errors that end a `blottercli` run.

use blotter::PipelineError;
use blotter_io::IoError;
use thiserror::Error;

/// Errors surfaced to the user before exiting with status 1.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// Bad command-line input, raised before any processing
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// A stage or the pipeline configuration failed
    #[error("Pipeline failed: {0}")]
    Pipeline(#[from] PipelineError),

    /// Reading the blotter or writing output or report failed
    #[error(transparent)]
    Io(#[from] IoError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CliError::InputValidation("no input blotter given".to_string());
        assert_eq!(err.to_string(), "Invalid input: no input blotter given");

        let err = CliError::from(PipelineError::InvalidConfig("precision".to_string()));
        assert!(err.to_string().starts_with("Pipeline failed: "));

        let err = CliError::from(IoError::MissingColumn("date"));
        assert_eq!(err.to_string(), IoError::MissingColumn("date").to_string());
    }
}
