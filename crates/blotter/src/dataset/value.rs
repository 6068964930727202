//! Derived return values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position's share of the fund's daily return.
///
/// `Decimal` has no not-a-number state, so a day whose total open liquidity
/// is zero is represented explicitly as [`Return::NaN`]. `NaN` absorbs
/// [`Return::checked_add`], which keeps a degenerate day visible after
/// aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Return {
    /// A defined return
    Value(Decimal),

    /// Undefined return (zero total fund value)
    NaN,
}

impl Return {
    /// Zero return.
    pub const ZERO: Self = Self::Value(Decimal::ZERO);

    /// Divide `pal` by `total`, yielding `NaN` when `total` is zero.
    ///
    /// Returns `None` when the quotient overflows the decimal range.
    pub fn ratio(pal: Decimal, total: Decimal) -> Option<Self> {
        if total.is_zero() {
            return Some(Self::NaN);
        }
        pal.checked_div(total).map(Self::Value)
    }

    /// Whether the return is undefined.
    pub const fn is_nan(&self) -> bool {
        matches!(self, Self::NaN)
    }

    /// Add two returns. `NaN` absorbs the sum.
    ///
    /// Returns `None` when the sum of two defined values overflows.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        match (self, rhs) {
            (Self::Value(a), Self::Value(b)) => a.checked_add(b).map(Self::Value),
            _ => Some(Self::NaN),
        }
    }

    /// The defined value, if any.
    pub const fn value(&self) -> Option<Decimal> {
        match self {
            Self::Value(v) => Some(*v),
            Self::NaN => None,
        }
    }
}

impl From<Decimal> for Return {
    fn from(value: Decimal) -> Self {
        Self::Value(value)
    }
}

impl fmt::Display for Return {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => fmt::Display::fmt(v, f),
            Self::NaN => f.write_str("NaN"),
        }
    }
}
