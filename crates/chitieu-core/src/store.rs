//! Storage seam for expense rows and the monthly-limit cell
//!
//! Backends live in `chitieu-store`; the dispatcher and aggregator only see
//! this trait. Reads return rows in insertion order, in raw string form.

use crate::types::ExpenseRow;
use anyhow::Result;
use async_trait::async_trait;

/// Trait all store backends implement
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Append one expense row; rows are immutable once written.
    async fn append(&self, row: ExpenseRow) -> Result<()>;

    /// All stored rows, oldest first.
    async fn all_rows(&self) -> Result<Vec<ExpenseRow>>;

    /// Raw content of the monthly-limit cell, `None` when the cell is empty.
    async fn read_limit_cell(&self) -> Result<Option<String>>;

    /// Overwrite the monthly-limit cell.
    async fn write_limit_cell(&self, value: &str) -> Result<()>;
}
