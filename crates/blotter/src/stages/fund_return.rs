//! Stage 5: each position's share of the fund's daily return.

use crate::context::{ExecutionContext, Partition};
use crate::dataset::{Column, Dataset, Position, Return, RowIndex, RowUpdate};
use crate::error::{PipelineError, Result};
use crate::pipeline::Stage;
use crate::stages::checked_add;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// Divides each row's pal by the day's total open liquidity.
///
/// A day whose total is zero yields [`Return::NaN`] for all its rows instead
/// of aborting the run. Rows folded into a representative by the open
/// liquidity stage contribute nothing and get no return.
#[derive(Debug, Clone, Copy, Default)]
pub struct FundReturn;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ReturnUpdate {
    row_index: RowIndex,
    ret: Return,
}

impl RowUpdate for ReturnUpdate {
    fn row_index(&self) -> RowIndex {
        self.row_index
    }

    fn apply(self, row: &mut Position) {
        row.ret = Some(self.ret);
    }
}

fn open_liq(row: &Position) -> Result<Decimal> {
    row.open_liq.ok_or(PipelineError::NotNormalized {
        row: row.index()?,
        column: "open_liq",
    })
}

/// Total open liquidity of the fund for one day.
fn total_fund_value(partition: &Partition<'_>) -> Result<Decimal> {
    partition
        .iter()
        .filter(|row| !row.is_folded())
        .try_fold(Decimal::ZERO, |total, row| {
            checked_add(total, open_liq(row)?, "total fund value")
        })
}

fn daily_returns(partition: &Partition<'_>) -> Result<Vec<ReturnUpdate>> {
    let total = total_fund_value(partition)?;
    debug!(date = %partition.key(), total_fund_value = %total, "Fund value at open");

    if total.is_zero() {
        warn!(
            date = %partition.key(),
            rows = partition.len(),
            "Total fund value is zero; returns for this day are undefined"
        );
    }

    partition
        .iter()
        .filter(|row| !row.is_folded())
        .map(|row| {
            let pal = row.pal()?;
            let ret = Return::ratio(pal, total).ok_or_else(|| {
                PipelineError::Arithmetic(format!(
                    "return of row {} overflows: {pal} / {total}",
                    row.row_index.unwrap_or_default()
                ))
            })?;
            Ok(ReturnUpdate {
                row_index: row.index()?,
                ret,
            })
        })
        .collect()
}

impl Stage for FundReturn {
    fn name(&self) -> &'static str {
        "fund_return"
    }

    fn transform(&self, mut data: Dataset, ctx: &ExecutionContext) -> Result<Dataset> {
        for row in data.rows_mut() {
            row.ret = None;
        }

        let partitions = ctx.partition(&data, &[Column::Date])?;
        let days = partitions.len();
        let updates = ctx.map_partitions(partitions, daily_returns)?;

        let undefined = updates.iter().filter(|u| u.ret.is_nan()).count();
        let merged = data.merge(updates)?;

        info!(days, merged, undefined, "Computed daily returns");
        Ok(data)
    }
}
