//! The tabular dataset threaded through the pipeline.
//!
//! A [`Dataset`] is an ordered, mutable collection of [`Position`] rows.
//! Partition-level computations never write into the dataset directly: they
//! produce owned [`RowUpdate`]s that are merged back by `row_index`.

pub mod position;
pub mod value;

pub use position::{Column, Field, GroupKey, KeyValue, Position};
pub use value::Return;

use crate::error::{PipelineError, Result};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Primary key of a position row.
pub type RowIndex = u64;

static NEXT_DATASET_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a dataset instance.
///
/// Every constructed or cloned dataset receives a fresh identity, which is how
/// the pipeline detects a stage that replaced its dataset while running in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatasetId(u64);

impl DatasetId {
    fn next() -> Self {
        Self(NEXT_DATASET_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// The raw identity value.
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A per-row result of a partition computation.
pub trait RowUpdate {
    /// The row the update targets.
    fn row_index(&self) -> RowIndex;

    /// Write the update into the target row.
    fn apply(self, row: &mut Position);
}

/// Ordered, mutable collection of position rows.
#[derive(Debug)]
pub struct Dataset {
    id: DatasetId,
    rows: Vec<Position>,
}

impl Dataset {
    /// Create a dataset from rows in input order.
    pub fn new(rows: Vec<Position>) -> Self {
        Self {
            id: DatasetId::next(),
            rows,
        }
    }

    /// Create an empty dataset.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// This instance's identity.
    pub const fn id(&self) -> DatasetId {
        self.id
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in dataset order.
    pub fn rows(&self) -> &[Position] {
        &self.rows
    }

    /// Mutable access to rows. The row count cannot change through this slice.
    pub fn rows_mut(&mut self) -> &mut [Position] {
        &mut self.rows
    }

    /// Iterate rows in dataset order.
    pub fn iter(&self) -> std::slice::Iter<'_, Position> {
        self.rows.iter()
    }

    /// Consume the dataset, returning its rows.
    pub fn into_rows(self) -> Vec<Position> {
        self.rows
    }

    /// Keep only rows matching the predicate, preserving order.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&Position) -> bool,
    {
        self.rows.retain(keep);
    }

    /// Stable sort of rows.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Position, &Position) -> Ordering,
    {
        self.rows.sort_by(compare);
    }

    /// Map from row_index to position in the row vector.
    ///
    /// Fails when a row has no index or two rows share one.
    pub fn index_lookup(&self) -> Result<HashMap<RowIndex, usize>> {
        let mut lookup = HashMap::with_capacity(self.rows.len());
        for (pos, row) in self.rows.iter().enumerate() {
            let idx = row.index()?;
            if lookup.insert(idx, pos).is_some() {
                return Err(PipelineError::DuplicateRowIndex(idx));
            }
        }
        Ok(lookup)
    }

    /// Merge partition results into the dataset keyed by `row_index`.
    ///
    /// Returns the number of rows updated. The row count is unchanged.
    pub fn merge<U, I>(&mut self, updates: I) -> Result<usize>
    where
        U: RowUpdate,
        I: IntoIterator<Item = U>,
    {
        let lookup = self.index_lookup()?;
        let mut merged = 0;
        for update in updates {
            let idx = update.row_index();
            let pos = *lookup
                .get(&idx)
                .ok_or(PipelineError::UnknownRowIndex(idx))?;
            update.apply(&mut self.rows[pos]);
            merged += 1;
        }
        Ok(merged)
    }
}

impl Clone for Dataset {
    fn clone(&self) -> Self {
        Self::new(self.rows.clone())
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<Position> for Dataset {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Position;
    type IntoIter = std::slice::Iter<'a, Position>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct SetOpenLiq(RowIndex, Decimal);

    impl RowUpdate for SetOpenLiq {
        fn row_index(&self) -> RowIndex {
            self.0
        }

        fn apply(self, row: &mut Position) {
            row.open_liq = Some(self.1);
        }
    }

    fn indexed(n: usize) -> Dataset {
        (0..n)
            .map(|i| {
                let mut pos = Position::raw("2024-01-01", "A", None, "a", "Energy", "1", "1");
                pos.row_index = Some(i as RowIndex);
                pos
            })
            .collect()
    }

    #[test]
    fn test_clone_has_new_identity() {
        let ds = indexed(2);
        let copy = ds.clone();
        assert_ne!(ds.id(), copy.id());
        assert_eq!(ds.rows(), copy.rows());
    }

    #[test]
    fn test_merge_by_row_index() {
        let mut ds = indexed(3);
        let merged = ds
            .merge(vec![SetOpenLiq(2, dec!(5)), SetOpenLiq(0, dec!(7))])
            .unwrap();

        assert_eq!(merged, 2);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.rows()[0].open_liq, Some(dec!(7)));
        assert_eq!(ds.rows()[1].open_liq, None);
        assert_eq!(ds.rows()[2].open_liq, Some(dec!(5)));
    }

    #[test]
    fn test_merge_unknown_row() {
        let mut ds = indexed(1);
        let err = ds.merge(vec![SetOpenLiq(9, dec!(1))]).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownRowIndex(9)));
    }

    #[test]
    fn test_duplicate_row_index_rejected() {
        let mut ds = indexed(2);
        ds.rows_mut()[1].row_index = Some(0);
        assert!(matches!(
            ds.index_lookup(),
            Err(PipelineError::DuplicateRowIndex(0))
        ));
    }
}
