//! Execution context: dataset ownership, execution mode, and partitioning.
//!
//! The context owns the dataset between stages. While a stage runs, the
//! pipeline driver hands it either the context's own dataset (in place) or a
//! clone (copy), together with a shared reference to the context for
//! partitioning. Stages never look at the mode themselves.

use crate::config::PipelineConfig;
use crate::dataset::{Column, Dataset, GroupKey, Position};
use crate::error::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use tracing::debug;

/// How stages receive and return the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Stages mutate the context's dataset and must return that same instance
    #[default]
    InPlace,

    /// Stages work on a copy; whatever they return replaces the dataset
    Copy,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InPlace => f.write_str("in-place"),
            Self::Copy => f.write_str("copy"),
        }
    }
}

/// A group of rows sharing the same key values, in dataset order.
#[derive(Debug, Clone)]
pub struct Partition<'a> {
    key: GroupKey,
    rows: Vec<&'a Position>,
}

impl<'a> Partition<'a> {
    /// The key tuple shared by every row.
    pub const fn key(&self) -> &GroupKey {
        &self.key
    }

    /// Rows of the partition in dataset order.
    pub fn rows(&self) -> &[&'a Position] {
        &self.rows
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the partition has no rows.
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Position> + '_ {
        self.rows.iter().copied()
    }
}

/// Partitions of a dataset, yielded in ascending key order.
#[derive(Debug)]
pub struct Partitions<'a> {
    inner: btree_map::IntoIter<GroupKey, Vec<&'a Position>>,
}

impl<'a> Iterator for Partitions<'a> {
    type Item = Partition<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, rows)| Partition { key, rows })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Partitions<'_> {}

/// Wraps the dataset and exposes partitioning to stages.
#[derive(Debug)]
pub struct ExecutionContext {
    mode: ExecutionMode,
    parallel: bool,
    dataset: Dataset,
}

impl ExecutionContext {
    /// Wrap a dataset with the given execution mode.
    pub const fn new(dataset: Dataset, mode: ExecutionMode) -> Self {
        Self {
            mode,
            parallel: false,
            dataset,
        }
    }

    /// Wrap a dataset using the mode and parallelism from a config.
    pub const fn from_config(dataset: Dataset, config: &PipelineConfig) -> Self {
        Self::new(dataset, config.mode).with_parallel(config.parallel)
    }

    /// Evaluate partitions on the rayon thread pool.
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The execution mode.
    pub const fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Whether partitions are evaluated in parallel.
    pub const fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// The dataset between stages. Empty while an in-place stage runs.
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Consume the context, returning the dataset.
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    pub(crate) fn take_dataset(&mut self) -> Dataset {
        std::mem::take(&mut self.dataset)
    }

    pub(crate) fn replace_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
    }

    /// Group rows of `data` by the given key columns.
    ///
    /// The caller supplies the view to partition: a stage passes the dataset it
    /// was handed, which under [`ExecutionMode::InPlace`] has been moved out of
    /// the context for the duration of the stage, so [`Self::dataset`] is
    /// empty while the stage runs. Groups come out in ascending key order and
    /// rows within a group keep dataset order. Fails if any row lacks a value
    /// for a key column.
    pub fn partition<'a>(&self, data: &'a Dataset, keys: &[Column]) -> Result<Partitions<'a>> {
        let mut groups: BTreeMap<GroupKey, Vec<&'a Position>> = BTreeMap::new();
        for row in data {
            let key = keys
                .iter()
                .map(|&column| row.key(column))
                .collect::<Result<Vec<_>>>()?;
            groups.entry(GroupKey(key)).or_default().push(row);
        }

        debug!(
            keys = ?keys.iter().map(Column::name).collect::<Vec<_>>(),
            partitions = groups.len(),
            rows = data.len(),
            "Partitioned dataset"
        );

        Ok(Partitions {
            inner: groups.into_iter(),
        })
    }

    /// Run `f` over every partition and concatenate the results in partition order.
    ///
    /// Partitions are disjoint, so with parallelism enabled they are evaluated
    /// concurrently; results are still returned in partition order.
    pub fn map_partitions<'a, T, F>(&self, partitions: Partitions<'a>, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&Partition<'a>) -> Result<Vec<T>> + Send + Sync,
    {
        let partitions: Vec<Partition<'a>> = partitions.collect();

        let nested: Vec<Vec<T>> = if self.parallel {
            partitions.par_iter().map(&f).collect::<Result<_>>()?
        } else {
            partitions.iter().map(&f).collect::<Result<_>>()?
        };

        Ok(nested.into_iter().flatten().collect())
    }
}
