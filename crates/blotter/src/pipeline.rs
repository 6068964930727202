//! Stage trait and pipeline driver.

use crate::config::PipelineConfig;
use crate::context::{ExecutionContext, ExecutionMode};
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::stages;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{error, info};

/// One transformation of the dataset.
///
/// A stage always returns a dataset. Under [`ExecutionMode::InPlace`] it must
/// return the instance it was given; under [`ExecutionMode::Copy`] it may
/// build and return a new one. Stages never inspect the mode.
pub trait Stage: Send + Sync {
    /// Short name used in logs and run reports.
    fn name(&self) -> &'static str;

    /// Transform the dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if a cell cannot be converted or a stage-ordering
    /// precondition does not hold.
    fn transform(&self, data: Dataset, ctx: &ExecutionContext) -> Result<Dataset>;
}

/// Timing and row counts for one stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    /// Stage name
    pub name: &'static str,
    /// Rows handed to the stage
    pub rows_in: usize,
    /// Rows after the stage
    pub rows_out: usize,
    /// Wall-clock time in milliseconds
    pub elapsed_ms: f64,
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Execution mode of the run
    pub mode: ExecutionMode,
    /// Whether partitions ran in parallel
    pub parallel: bool,
    /// Per-stage reports in execution order
    pub stages: Vec<StageReport>,
}

impl RunReport {
    /// Rows handed to the first stage.
    pub fn rows_in(&self) -> usize {
        self.stages.first().map_or(0, |s| s.rows_in)
    }

    /// Rows left after the last stage.
    pub fn rows_out(&self) -> usize {
        self.stages.last().map_or(0, |s| s.rows_out)
    }

    /// Total wall-clock time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.stages.iter().map(|s| s.elapsed_ms).sum()
    }
}

/// Ordered list of stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Pipeline {
    /// Create a pipeline from stages in execution order.
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// The six-stage blotter pipeline.
    pub fn blotter(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(stages::blotter_stages(config.precision()?)))
    }

    /// Names of the stages in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Drive every stage against the context, in order.
    ///
    /// In place, each stage receives the context's own dataset and must hand
    /// the same instance back. In copy mode each stage receives a clone and
    /// its output replaces the context's dataset.
    ///
    /// # Errors
    ///
    /// Fails on the first stage error, or with
    /// [`PipelineError::ContractViolation`] when an in-place stage returns a
    /// different dataset.
    pub fn run(&self, ctx: &mut ExecutionContext) -> Result<RunReport> {
        let mut report = RunReport {
            mode: ctx.mode(),
            parallel: ctx.is_parallel(),
            stages: Vec::with_capacity(self.stages.len()),
        };

        info!(mode = %ctx.mode(), stages = self.stages.len(), "Starting pipeline");

        for stage in &self.stages {
            let started = Instant::now();
            let rows_in = ctx.dataset().len();

            let output = match ctx.mode() {
                ExecutionMode::InPlace => {
                    let input = ctx.take_dataset();
                    let expected = input.id();
                    let output = stage.transform(input, ctx)?;
                    if output.id() != expected {
                        error!(
                            stage = stage.name(),
                            expected = %expected,
                            actual = %output.id(),
                            "Stage replaced the dataset in in-place mode"
                        );
                        return Err(PipelineError::ContractViolation {
                            stage: stage.name(),
                            expected: expected.get(),
                            actual: output.id().get(),
                        });
                    }
                    output
                }
                ExecutionMode::Copy => {
                    let input = ctx.dataset().clone();
                    stage.transform(input, ctx)?
                }
            };

            let stage_report = StageReport {
                name: stage.name(),
                rows_in,
                rows_out: output.len(),
                elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
            };
            info!(
                stage = stage_report.name,
                rows_in = stage_report.rows_in,
                rows_out = stage_report.rows_out,
                elapsed_ms = stage_report.elapsed_ms,
                "Stage finished"
            );

            ctx.replace_dataset(output);
            report.stages.push(stage_report);
        }

        info!(
            rows_in = report.rows_in(),
            rows_out = report.rows_out(),
            "Pipeline finished"
        );
        Ok(report)
    }
}
