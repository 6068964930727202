//! The six blotter stages.
//!
//! | # | stage                | grain                  |
//! |---|----------------------|------------------------|
//! | 1 | [`PrimaryKey`]       | row                    |
//! | 2 | [`Normalize`]        | row                    |
//! | 3 | [`ImputeTicker`]     | row                    |
//! | 4 | [`OpenLiquidity`]    | (`lkid`, `ticker`)     |
//! | 5 | [`FundReturn`]       | `date`                 |
//! | 6 | [`DailyAggregate`]   | (`date`, `lkid`)       |

pub mod daily_aggregate;
pub mod fund_return;
pub mod impute_ticker;
pub mod normalize;
pub mod open_liquidity;
pub mod primary_key;

pub use daily_aggregate::DailyAggregate;
pub use fund_return::FundReturn;
pub use impute_ticker::ImputeTicker;
pub use normalize::Normalize;
pub use open_liquidity::OpenLiquidity;
pub use primary_key::PrimaryKey;

use crate::error::{PipelineError, Result};
use crate::parse::Precision;
use crate::pipeline::Stage;
use rust_decimal::Decimal;

/// The stages of the blotter pipeline in execution order.
pub fn blotter_stages(precision: Precision) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(PrimaryKey),
        Box::new(Normalize::new(precision)),
        Box::new(ImputeTicker),
        Box::new(OpenLiquidity),
        Box::new(FundReturn),
        Box::new(DailyAggregate),
    ]
}

/// Keep the smaller of two strings, the deterministic tie-break for
/// descriptive columns when rows are collapsed.
pub(crate) fn keep_min(current: &mut String, candidate: &str) {
    if candidate < current.as_str() {
        candidate.clone_into(current);
    }
}

/// `a + b`, or an arithmetic error naming `what` when the sum overflows.
pub(crate) fn checked_add(a: Decimal, b: Decimal, what: &str) -> Result<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| PipelineError::Arithmetic(format!("{what} overflows: {a} + {b}")))
}
