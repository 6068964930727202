//! Cell parsing for decimals and dates.
//!
//! Decimals are parsed exactly and then rounded to an explicit [`Precision`]
//! (significant digits). Dates are parsed with year-first precedence: a
//! leading four-digit or compact `YYYYMMDD` field is the year, a leading
//! two-digit field is read as `YY-MM-DD`, and only when the first field can't
//! be a year does a trailing `MM/DD/YYYY` form apply.
//!
//! Two-digit years resolve to the year within 50 years of the current one,
//! so in 2026 `69` is 2069 and `76` is 1976.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Largest number of significant digits a [`Decimal`] always represents.
pub const MAX_PRECISION: u32 = 28;

/// Significant-digit precision applied when constructing decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision(u32);

impl Precision {
    /// Create a precision, returning `None` outside `1..=28`.
    pub const fn new(digits: u32) -> Option<Self> {
        if digits == 0 || digits > MAX_PRECISION {
            None
        } else {
            Some(Self(digits))
        }
    }

    /// Number of significant digits.
    pub const fn digits(&self) -> u32 {
        self.0
    }

    /// Parse a decimal, rounding half-even to this precision.
    pub fn parse_decimal(&self, text: &str) -> Result<Decimal, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("empty value".to_string());
        }

        let value = if text.contains(['e', 'E']) {
            Decimal::from_scientific(text)
        } else {
            Decimal::from_str_exact(text).or_else(|_| Decimal::from_str(text))
        }
        .map_err(|e| format!("invalid decimal: {e}"))?;

        Ok(self.round(value))
    }

    /// Round to this precision. Values already within it are returned as-is.
    pub fn round(&self, value: Decimal) -> Decimal {
        if significant_digits(value) <= self.0 {
            return value;
        }
        value
            .round_sf_with_strategy(self.0, RoundingStrategy::MidpointNearestEven)
            .unwrap_or(value)
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self(MAX_PRECISION)
    }
}

fn significant_digits(value: Decimal) -> u32 {
    let mantissa = value.mantissa().unsigned_abs();
    if mantissa == 0 {
        return 1;
    }
    mantissa.ilog10() + 1
}

/// Parse a calendar date with year-first precedence.
///
/// A trailing time component is discarded.
pub fn parse_date(text: &str) -> Result<NaiveDate, String> {
    let date_part = strip_time(text.trim());
    if date_part.is_empty() {
        return Err("empty value".to_string());
    }

    if date_part.len() == 8 && date_part.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(date_part, "%Y%m%d")
            .map_err(|e| format!("invalid compact date: {e}"));
    }

    let sep = date_part
        .chars()
        .find(|c| matches!(c, '-' | '/' | '.'))
        .ok_or_else(|| "unrecognized date format".to_string())?;
    let fields: Vec<&str> = date_part.split(sep).collect();
    if fields.len() != 3 || fields.iter().any(|f| f.is_empty()) {
        return Err("unrecognized date format".to_string());
    }

    let pattern = match (fields[0].len(), fields[2].len()) {
        (4, _) => format!("%Y{sep}%m{sep}%d"),
        (_, 4) => format!("%m{sep}%d{sep}%Y"),
        (2, 2) => return short_year_date(&fields, Utc::now().year()),
        _ => return Err("unrecognized date format".to_string()),
    };

    NaiveDate::parse_from_str(date_part, &pattern).map_err(|e| format!("invalid date: {e}"))
}

/// `YY-MM-DD` with the year resolved against `current_year`.
fn short_year_date(fields: &[&str], current_year: i32) -> Result<NaiveDate, String> {
    let number = |field: &str| {
        if field.bytes().all(|b| b.is_ascii_digit()) {
            field.parse::<u32>().map_err(|e| format!("invalid date: {e}"))
        } else {
            Err(format!("invalid date: non-numeric field '{field}'"))
        }
    };
    let (yy, month, day) = (number(fields[0])?, number(fields[1])?, number(fields[2])?);
    let year = expand_two_digit_year(yy, current_year);

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| "invalid date: no such calendar day".to_string())
}

/// The year ending in `yy` that lies within 50 years of `current_year`.
fn expand_two_digit_year(yy: u32, current_year: i32) -> i32 {
    let year = current_year - current_year.rem_euclid(100) + yy as i32;
    if year >= current_year + 50 {
        year - 100
    } else if year < current_year - 50 {
        year + 100
    } else {
        year
    }
}

fn strip_time(text: &str) -> &str {
    let cut = text.find(['T', ' ']).unwrap_or(text.len());
    &text[..cut]
}
