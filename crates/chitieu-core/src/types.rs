//! Shared types for chitieu-core

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp format used in the expense sheet ("2024-03-01 12:30:00").
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Incoming chat message from any transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Chat identifier, used as the ownership scope for records
    pub chat_id: String,
    pub text: String,
}

/// One row of the expense sheet, in stored string form.
///
/// Fields stay as strings so the aggregator can tolerate rows that were
/// hand-edited in the sheet; parsing happens (and may fail per-row) at
/// aggregation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRow {
    pub timestamp: String,
    pub amount: String,
    pub category: String,
    pub note: String,
    pub chat_id: String,
}

impl ExpenseRow {
    /// Build a fresh row for a just-recorded expense.
    pub fn new(now: NaiveDateTime, amount: i64, category: &str, note: &str, chat_id: &str) -> Self {
        Self {
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            amount: amount.to_string(),
            category: category.to_string(),
            note: note.to_string(),
            chat_id: chat_id.to_string(),
        }
    }
}
