//! Position rows and their key columns.

use super::RowIndex;
use super::value::Return;
use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell that holds either its raw input text or its parsed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field<T> {
    /// Input text, not parsed yet
    Raw(String),

    /// Parsed value
    Typed(T),
}

impl<T: Copy> Field<T> {
    /// The parsed value, if the field has been normalized.
    pub const fn typed(&self) -> Option<T> {
        match self {
            Self::Typed(v) => Some(*v),
            Self::Raw(_) => None,
        }
    }
}

impl<T> Field<T> {
    /// The raw text, if the field has not been normalized.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Raw(s) => Some(s),
            Self::Typed(_) => None,
        }
    }

    /// Whether the field still holds input text.
    pub const fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Typed(value)
    }
}

/// One observed (analyst, security, day) fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Stable identity, assigned from input order
    pub row_index: Option<RowIndex>,

    /// Trading day
    pub date: Field<NaiveDate>,

    /// Fund or book the position belongs to
    pub lkid: String,

    /// Security identifier
    pub ticker: Option<String>,

    /// Owning analyst
    pub analyst: String,

    /// Sector classification
    pub sector: String,

    /// Profit and loss for the day
    pub pal: Field<Decimal>,

    /// End-of-day capital exposure
    pub exposure: Field<Decimal>,

    /// Liquidity available at the open
    pub open_liq: Option<Decimal>,

    /// Share of the fund's daily return
    pub ret: Option<Return>,

    /// Representative row this row was collapsed into, if any
    pub folded_into: Option<RowIndex>,
}

impl Position {
    /// Create a position from raw input cells.
    pub fn raw(
        date: impl Into<String>,
        lkid: impl Into<String>,
        ticker: Option<String>,
        analyst: impl Into<String>,
        sector: impl Into<String>,
        pal: impl Into<String>,
        exposure: impl Into<String>,
    ) -> Self {
        Self {
            row_index: None,
            date: Field::Raw(date.into()),
            lkid: lkid.into(),
            ticker,
            analyst: analyst.into(),
            sector: sector.into(),
            pal: Field::Raw(pal.into()),
            exposure: Field::Raw(exposure.into()),
            open_liq: None,
            ret: None,
            folded_into: None,
        }
    }

    /// The row's primary key.
    pub const fn index(&self) -> Result<RowIndex> {
        match self.row_index {
            Some(idx) => Ok(idx),
            None => Err(PipelineError::MissingRowIndex),
        }
    }

    /// The parsed trading day.
    pub fn date(&self) -> Result<NaiveDate> {
        self.typed(&self.date, "date")
    }

    /// The parsed profit and loss.
    pub fn pal(&self) -> Result<Decimal> {
        self.typed(&self.pal, "pal")
    }

    /// The parsed exposure.
    pub fn exposure(&self) -> Result<Decimal> {
        self.typed(&self.exposure, "exposure")
    }

    /// Whether this row's values live in another (representative) row.
    pub const fn is_folded(&self) -> bool {
        self.folded_into.is_some()
    }

    /// The value of a key column, used for partitioning.
    pub fn key(&self, column: Column) -> Result<KeyValue> {
        let text = |value: Option<&String>| match value {
            Some(v) if !v.is_empty() => Ok(KeyValue::Text(v.clone())),
            _ => Err(PipelineError::MissingKey {
                row: self.row_index.unwrap_or_default(),
                column: column.name(),
            }),
        };

        match column {
            Column::RowIndex => self.index().map(KeyValue::Index),
            Column::Date => self.date().map(KeyValue::Date),
            Column::Lkid => text(Some(&self.lkid)),
            Column::Ticker => text(self.ticker.as_ref()),
            Column::Analyst => text(Some(&self.analyst)),
            Column::Sector => text(Some(&self.sector)),
        }
    }

    fn typed<T: Copy>(&self, field: &Field<T>, column: &'static str) -> Result<T> {
        let row = self.index()?;
        field
            .typed()
            .ok_or(PipelineError::NotNormalized { row, column })
    }
}

/// Columns a dataset can be partitioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// Primary key
    RowIndex,
    /// Trading day
    Date,
    /// Fund or book
    Lkid,
    /// Security
    Ticker,
    /// Analyst
    Analyst,
    /// Sector
    Sector,
}

impl Column {
    /// The column's name as it appears in files.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RowIndex => "row_index",
            Self::Date => "date",
            Self::Lkid => "lkid",
            Self::Ticker => "ticker",
            Self::Analyst => "analyst",
            Self::Sector => "sector",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single key column value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyValue {
    /// Row index value
    Index(RowIndex),
    /// Date value
    Date(NaiveDate),
    /// Text value
    Text(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// The tuple of key values identifying a partition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey(pub Vec<KeyValue>);

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str(")")
    }
}
