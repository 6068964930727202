//! Stage 3: synthesize tickers for rows that have none.
//!
//! Returns are aggregated over (`date`, `lkid`), not by ticker, so the ticker
//! only scopes the liquidity sequence of stage 4. A synthetic ticker derived
//! from `row_index` is unique per row, which makes each such row its own
//! single-row liquidity sequence.

use crate::context::ExecutionContext;
use crate::dataset::{Dataset, RowIndex};
use crate::error::Result;
use crate::pipeline::Stage;
use tracing::info;

/// Fills absent or blank tickers with `ticker_<row_index>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImputeTicker;

/// The placeholder ticker for a row.
pub fn synthetic_ticker(row_index: RowIndex) -> String {
    format!("ticker_{row_index}")
}

impl Stage for ImputeTicker {
    fn name(&self) -> &'static str {
        "impute_ticker"
    }

    fn transform(&self, mut data: Dataset, _ctx: &ExecutionContext) -> Result<Dataset> {
        let mut imputed = 0usize;
        for row in data.rows_mut() {
            let missing = row.ticker.as_deref().is_none_or(|t| t.trim().is_empty());
            if missing {
                row.ticker = Some(synthetic_ticker(row.index()?));
                imputed += 1;
            }
        }

        if imputed > 0 {
            info!(rows = data.len(), imputed, "Imputed synthetic tickers");
        }
        Ok(data)
    }
}
