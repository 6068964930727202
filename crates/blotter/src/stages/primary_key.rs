//! Stage 1: assign `row_index` from input order.

use crate::context::ExecutionContext;
use crate::dataset::{Dataset, RowIndex};
use crate::error::Result;
use crate::pipeline::Stage;
use tracing::info;

/// Records each row's position in the original input as its primary key.
///
/// Every later merge keys on `row_index`, so this runs before anything
/// reorders or partitions rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryKey;

impl Stage for PrimaryKey {
    fn name(&self) -> &'static str {
        "primary_key"
    }

    fn transform(&self, mut data: Dataset, _ctx: &ExecutionContext) -> Result<Dataset> {
        for (pos, row) in data.rows_mut().iter_mut().enumerate() {
            row.row_index = Some(pos as RowIndex);
        }
        info!(rows = data.len(), "Assigned primary keys");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionMode;
    use crate::dataset::Position;

    #[test]
    fn test_assigns_input_order() {
        let data: Dataset = ["2024-01-03", "2024-01-01", "2024-01-02"]
            .into_iter()
            .map(|d| Position::raw(d, "A", None, "a", "Energy", "1", "1"))
            .collect();
        let ctx = ExecutionContext::new(Dataset::empty(), ExecutionMode::InPlace);

        let out = PrimaryKey.transform(data, &ctx).unwrap();
        let idx: Vec<_> = out.iter().map(|r| r.row_index).collect();
        assert_eq!(idx, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(out.rows()[1].date.raw(), Some("2024-01-01"));
    }

    #[test]
    fn test_keeps_dataset_identity() {
        let data: Dataset = vec![Position::raw("2024-01-01", "A", None, "a", "E", "1", "1")]
            .into_iter()
            .collect();
        let id = data.id();
        let ctx = ExecutionContext::new(Dataset::empty(), ExecutionMode::InPlace);

        assert_eq!(PrimaryKey.transform(data, &ctx).unwrap().id(), id);
    }
}
