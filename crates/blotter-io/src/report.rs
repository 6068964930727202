//! JSON record of a pipeline run.

use crate::error::Result;
use blotter::RunReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A run report together with the files it read and wrote.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Report generation timestamp.
    pub generated_at: DateTime<Utc>,

    /// Input blotter.
    pub input: PathBuf,

    /// Output blotter.
    pub output: PathBuf,

    /// Rows read.
    pub rows_in: usize,

    /// Rows written.
    pub rows_out: usize,

    /// Total stage time in milliseconds.
    pub elapsed_ms: f64,

    /// Per-stage details.
    pub run: RunReport,
}

impl RunSummary {
    /// Create a summary stamped with the current time.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, run: RunReport) -> Self {
        Self {
            generated_at: Utc::now(),
            input: input.into(),
            output: output.into(),
            rows_in: run.rows_in(),
            rows_out: run.rows_out(),
            elapsed_ms: run.elapsed_ms(),
            run,
        }
    }

    /// Convert the summary to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the summary as JSON to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), "Wrote run report");
        Ok(())
    }
}
