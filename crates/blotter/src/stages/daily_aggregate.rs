//! Stage 6: one row per (`date`, `lkid`).

use crate::context::{ExecutionContext, Partition};
use crate::dataset::{Column, Dataset, Position, Return, RowIndex, RowUpdate};
use crate::error::{PipelineError, Result};
use crate::pipeline::Stage;
use crate::stages::{checked_add, keep_min};
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::info;

/// Folds every (`date`, `lkid`) group into its representative row.
///
/// The representative is the row with the smallest `row_index`. It receives
/// the smallest analyst and sector and the sums of pal, exposure and return;
/// every other row of the group is dropped. Survivors are sorted by
/// (`lkid`, `date`). This is the only stage that removes rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyAggregate;

#[derive(Debug, Clone, PartialEq)]
struct DailyTotal {
    row_index: RowIndex,
    analyst: String,
    sector: String,
    pal: Decimal,
    exposure: Decimal,
    ret: Return,
}

impl RowUpdate for DailyTotal {
    fn row_index(&self) -> RowIndex {
        self.row_index
    }

    fn apply(self, row: &mut Position) {
        row.analyst = self.analyst;
        row.sector = self.sector;
        row.pal = self.pal.into();
        row.exposure = self.exposure.into();
        row.ret = Some(self.ret);
    }
}

fn row_return(row: &Position) -> Result<Return> {
    row.ret.ok_or(PipelineError::NotNormalized {
        row: row.index()?,
        column: "return",
    })
}

fn aggregate_group(partition: &Partition<'_>) -> Result<Vec<DailyTotal>> {
    let Some(first) = partition.iter().next() else {
        return Ok(Vec::new());
    };

    let mut total = DailyTotal {
        row_index: first.index()?,
        analyst: first.analyst.clone(),
        sector: first.sector.clone(),
        pal: Decimal::ZERO,
        exposure: Decimal::ZERO,
        ret: Return::ZERO,
    };

    for row in partition.iter() {
        total.row_index = total.row_index.min(row.index()?);
        keep_min(&mut total.analyst, &row.analyst);
        keep_min(&mut total.sector, &row.sector);
        if row.is_folded() {
            continue;
        }
        total.pal = checked_add(total.pal, row.pal()?, "daily pal")?;
        total.exposure = checked_add(total.exposure, row.exposure()?, "daily exposure")?;
        total.ret = total
            .ret
            .checked_add(row_return(row)?)
            .ok_or_else(|| {
                PipelineError::Arithmetic(format!(
                    "daily return of row {} overflows",
                    total.row_index
                ))
            })?;
    }

    Ok(vec![total])
}

impl Stage for DailyAggregate {
    fn name(&self) -> &'static str {
        "daily_aggregate"
    }

    fn transform(&self, mut data: Dataset, ctx: &ExecutionContext) -> Result<Dataset> {
        let rows_in = data.len();
        let partitions = ctx.partition(&data, &[Column::Date, Column::Lkid])?;
        let totals = ctx.map_partitions(partitions, aggregate_group)?;

        let representatives: HashSet<RowIndex> = totals.iter().map(|t| t.row_index).collect();
        data.merge(totals)?;

        data.retain(|row| {
            row.row_index
                .is_some_and(|idx| representatives.contains(&idx))
        });
        data.sort_by(|a, b| {
            a.lkid
                .cmp(&b.lkid)
                .then_with(|| a.date.typed().cmp(&b.date.typed()))
        });

        info!(
            rows_in,
            rows_out = data.len(),
            "Aggregated to one row per (date, lkid)"
        );
        Ok(data)
    }
}
