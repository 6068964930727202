//! Pipeline configuration.

use crate::context::ExecutionMode;
use crate::error::{PipelineError, Result};
use crate::parse::{MAX_PRECISION, Precision};
use serde::{Deserialize, Serialize};

/// Configuration for a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Whether stages mutate the dataset or work on copies (default: in place)
    pub mode: ExecutionMode,
    /// Significant digits for pal and exposure (default: 28)
    pub precision: u32,
    /// Evaluate partitions on the rayon thread pool (default: false)
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::InPlace,
            precision: MAX_PRECISION,
            parallel: false,
        }
    }
}

impl PipelineConfig {
    /// Validated decimal precision.
    pub fn precision(&self) -> Result<Precision> {
        Precision::new(self.precision).ok_or_else(|| {
            PipelineError::InvalidConfig(format!(
                "precision must be between 1 and {MAX_PRECISION}, got {}",
                self.precision
            ))
        })
    }

    /// Check every setting before a run starts.
    pub fn validate(&self) -> Result<()> {
        self.precision().map(|_| ())
    }
}
