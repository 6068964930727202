//! Stage 2: canonicalize sectors and parse pal, exposure and date.

use crate::context::ExecutionContext;
use crate::dataset::{Dataset, Field};
use crate::error::{PipelineError, Result};
use crate::parse::{Precision, parse_date};
use crate::pipeline::Stage;
use crate::sector::canonical_sector;
use tracing::info;

/// Converts raw cells into typed values.
///
/// Decimals are built with the stage's own [`Precision`]; nothing about the
/// precision is process-wide. Fields that are already typed are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalize {
    precision: Precision,
}

impl Normalize {
    /// Create the stage with the given decimal precision.
    pub const fn new(precision: Precision) -> Self {
        Self { precision }
    }

    /// The decimal precision in use.
    pub const fn precision(&self) -> Precision {
        self.precision
    }
}

impl Stage for Normalize {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn transform(&self, mut data: Dataset, _ctx: &ExecutionContext) -> Result<Dataset> {
        let mut renamed = 0usize;

        for (pos, row) in data.rows_mut().iter_mut().enumerate() {
            let parse_error = |column: &'static str, value: &str, reason: String| {
                PipelineError::Parse {
                    row: pos,
                    column,
                    value: value.to_string(),
                    reason,
                }
            };

            let sector = row.sector.trim();
            if sector.is_empty() {
                return Err(parse_error("sector", &row.sector, "empty category".to_string()));
            }
            let canonical = canonical_sector(sector);
            if canonical != sector {
                renamed += 1;
            }
            row.sector = canonical.to_string();

            if let Field::Raw(text) = &row.pal {
                let value = self
                    .precision
                    .parse_decimal(text)
                    .map_err(|reason| parse_error("pal", text, reason))?;
                row.pal = Field::Typed(value);
            }

            if let Field::Raw(text) = &row.exposure {
                let value = self
                    .precision
                    .parse_decimal(text)
                    .map_err(|reason| parse_error("exposure", text, reason))?;
                row.exposure = Field::Typed(value);
            }

            if let Field::Raw(text) = &row.date {
                let value = parse_date(text).map_err(|reason| parse_error("date", text, reason))?;
                row.date = Field::Typed(value);
            }
        }

        info!(
            rows = data.len(),
            renamed_sectors = renamed,
            precision = self.precision.digits(),
            "Normalized sectors, decimals and dates"
        );
        Ok(data)
    }
}
