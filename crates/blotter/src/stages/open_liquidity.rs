//! Stage 4: liquidity available at the open of each trading day.
//!
//! Within a (`lkid`, `ticker`) liquidity sequence, the end-of-day exposure of
//! day `d + 1` is the open liquidity of day `d`. The match is by calendar
//! value, so a sequence with a gap after `d` gets no carried-over exposure
//! for `d`. Those days, and the last day of every sequence, fall back to
//! `exposure - pal`: the end-of-day exposure with the day's profit reversed.
//!
//! Rows sharing a date inside one sequence are collapsed first. The collapsed
//! values are written to the representative row (smallest `row_index`); the
//! other rows of the collision are marked as folded into it so later sums
//! don't count them twice.

use crate::context::{ExecutionContext, Partition};
use crate::dataset::{Column, Dataset, Position, RowIndex, RowUpdate};
use crate::error::{PipelineError, Result};
use crate::pipeline::Stage;
use crate::stages::{checked_add, keep_min};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Computes `open_liq` per (`lkid`, `ticker`) liquidity sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenLiquidity;

/// One collapsed day of a liquidity sequence.
#[derive(Debug, Clone, PartialEq)]
struct CollapsedDay {
    row_index: RowIndex,
    analyst: String,
    sector: String,
    pal: Decimal,
    exposure: Decimal,
    members: Vec<RowIndex>,
}

impl CollapsedDay {
    fn from_row(row: &Position) -> Result<Self> {
        let row_index = row.index()?;
        Ok(Self {
            row_index,
            analyst: row.analyst.clone(),
            sector: row.sector.clone(),
            pal: row.pal()?,
            exposure: row.exposure()?,
            members: vec![row_index],
        })
    }

    fn absorb(&mut self, row: &Position) -> Result<()> {
        let row_index = row.index()?;
        self.row_index = self.row_index.min(row_index);
        keep_min(&mut self.analyst, &row.analyst);
        keep_min(&mut self.sector, &row.sector);
        self.pal = checked_add(self.pal, row.pal()?, "collapsed pal")?;
        self.exposure = checked_add(self.exposure, row.exposure()?, "collapsed exposure")?;
        self.members.push(row_index);
        Ok(())
    }
}

/// Result of the stage for one row.
#[derive(Debug, Clone, PartialEq)]
enum LiquidityUpdate {
    /// Collapsed values for the representative row of a day
    Representative {
        row_index: RowIndex,
        analyst: String,
        sector: String,
        pal: Decimal,
        exposure: Decimal,
        open_liq: Decimal,
    },

    /// A same-day duplicate whose values moved into `into`
    Folded { row_index: RowIndex, into: RowIndex },
}

impl RowUpdate for LiquidityUpdate {
    fn row_index(&self) -> RowIndex {
        match self {
            Self::Representative { row_index, .. } | Self::Folded { row_index, .. } => *row_index,
        }
    }

    fn apply(self, row: &mut Position) {
        match self {
            Self::Representative {
                analyst,
                sector,
                pal,
                exposure,
                open_liq,
                ..
            } => {
                row.analyst = analyst;
                row.sector = sector;
                row.pal = pal.into();
                row.exposure = exposure.into();
                row.open_liq = Some(open_liq);
                row.folded_into = None;
            }
            Self::Folded { into, .. } => {
                row.open_liq = None;
                row.folded_into = Some(into);
            }
        }
    }
}

/// Collapse same-day rows of one sequence, keyed and ordered by date.
fn collapse_days(partition: &Partition<'_>) -> Result<BTreeMap<NaiveDate, CollapsedDay>> {
    let mut days: BTreeMap<NaiveDate, CollapsedDay> = BTreeMap::new();
    for row in partition.iter() {
        let date = row.date()?;
        match days.get_mut(&date) {
            Some(day) => day.absorb(row)?,
            None => {
                days.insert(date, CollapsedDay::from_row(row)?);
            }
        }
    }
    Ok(days)
}

/// Open liquidity for every collapsed day of a sequence, in date order.
///
/// `open_liq(d)` is the exposure of the day dated exactly `d + 1`, or
/// `exposure(d) - pal(d)` when no such day exists.
fn open_liquidity(days: &BTreeMap<NaiveDate, CollapsedDay>) -> Result<Vec<(NaiveDate, Decimal)>> {
    days.iter()
        .map(|(date, day)| {
            let next_exposure = date
                .succ_opt()
                .and_then(|next| days.get(&next))
                .map(|next| next.exposure);
            let open_liq = match next_exposure {
                Some(exposure) => exposure,
                None => day.exposure.checked_sub(day.pal).ok_or_else(|| {
                    PipelineError::Arithmetic(format!(
                        "open liquidity of row {} overflows: {} - {}",
                        day.row_index, day.exposure, day.pal
                    ))
                })?,
            };
            Ok((*date, open_liq))
        })
        .collect()
}

fn sequence_updates(partition: &Partition<'_>) -> Result<Vec<LiquidityUpdate>> {
    let days = collapse_days(partition)?;
    let open = open_liquidity(&days)?;

    let imputed = open
        .iter()
        .filter(|(date, _)| date.succ_opt().is_none_or(|next| !days.contains_key(&next)))
        .count();
    debug!(
        key = %partition.key(),
        rows = partition.len(),
        days = days.len(),
        imputed,
        "Computed open liquidity"
    );

    let mut updates = Vec::with_capacity(partition.len());
    for ((_, day), (_, open_liq)) in days.into_iter().zip(open) {
        let rep = day.row_index;
        updates.extend(
            day.members
                .iter()
                .filter(|&&idx| idx != rep)
                .map(|&idx| LiquidityUpdate::Folded {
                    row_index: idx,
                    into: rep,
                }),
        );
        updates.push(LiquidityUpdate::Representative {
            row_index: rep,
            analyst: day.analyst,
            sector: day.sector,
            pal: day.pal,
            exposure: day.exposure,
            open_liq,
        });
    }
    Ok(updates)
}

impl Stage for OpenLiquidity {
    fn name(&self) -> &'static str {
        "open_liquidity"
    }

    fn transform(&self, mut data: Dataset, ctx: &ExecutionContext) -> Result<Dataset> {
        for row in data.rows_mut() {
            row.open_liq = None;
            row.folded_into = None;
        }

        let partitions = ctx.partition(&data, &[Column::Lkid, Column::Ticker])?;
        let sequences = partitions.len();
        let updates = ctx.map_partitions(partitions, sequence_updates)?;

        let folded = updates
            .iter()
            .filter(|u| matches!(u, LiquidityUpdate::Folded { .. }))
            .count();
        let merged = data.merge(updates)?;

        info!(
            sequences,
            merged, folded, "Computed open liquidity per (lkid, ticker) sequence"
        );
        Ok(data)
    }
}
