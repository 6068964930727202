#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/blotter/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod parse;
pub mod pipeline;
pub mod sector;
pub mod stages;

pub use config::PipelineConfig;
pub use context::{ExecutionContext, ExecutionMode, Partition, Partitions};
pub use dataset::{Column, Dataset, DatasetId, Field, Position, Return, RowIndex, RowUpdate};
pub use error::{PipelineError, Result};
pub use parse::Precision;
pub use pipeline::{Pipeline, RunReport, Stage, StageReport};

/// Output columns of the pipeline, in order.
pub const OUTPUT_COLUMNS: [&str; 7] = [
    "lkid", "date", "analyst", "sector", "pal", "exposure", "return",
];

/// Run the six-stage pipeline over a dataset.
///
/// # Errors
///
/// Returns the first stage error, or a configuration error before any stage runs.
pub fn run(dataset: Dataset, config: &PipelineConfig) -> Result<(Dataset, RunReport)> {
    let pipeline = Pipeline::blotter(config)?;
    let mut ctx = ExecutionContext::from_config(dataset, config);
    let report = pipeline.run(&mut ctx)?;
    Ok((ctx.into_dataset(), report))
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_run_empty_dataset() {
        let (out, report) = run(Dataset::empty(), &PipelineConfig::default()).unwrap();
        assert!(out.is_empty());
        assert_eq!(report.stages.len(), 6);
    }
}
