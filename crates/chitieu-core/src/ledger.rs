//! Period aggregation and the monthly-limit accessor

use crate::period::Period;
use crate::store::ExpenseStore;
use crate::types::TIMESTAMP_FORMAT;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::{debug, warn};

/// Sum all expenses for `chat_id` whose timestamp falls in the same `period`
/// instance as `now`.
///
/// Malformed rows (unparsable timestamp or amount) are skipped; a sheet that
/// has been hand-edited must not break reporting. Returns 0 when nothing
/// matches.
pub async fn sum_period(
    store: &dyn ExpenseStore,
    chat_id: &str,
    period: Period,
    now: NaiveDateTime,
) -> Result<i64> {
    let rows = store.all_rows().await.context("failed to read expense rows")?;

    let mut total: i64 = 0;
    let mut skipped = 0usize;
    for row in &rows {
        let Ok(ts) = NaiveDateTime::parse_from_str(&row.timestamp, TIMESTAMP_FORMAT) else {
            skipped += 1;
            continue;
        };
        if !period.contains(ts, now) || row.chat_id != chat_id {
            continue;
        }
        let Some(amount) = parse_stored_amount(&row.amount) else {
            skipped += 1;
            continue;
        };
        total += amount;
    }

    if skipped > 0 {
        debug!("Skipped {} malformed rows while summing", skipped);
    }
    Ok(total)
}

/// Current monthly limit. Never fails: any read or parse problem yields
/// `fallback` so commands that only consult the limit keep working when the
/// config tab is missing or mangled.
pub async fn monthly_limit(store: &dyn ExpenseStore, fallback: i64) -> i64 {
    match store.read_limit_cell().await {
        Ok(Some(raw)) => parse_stored_amount(&raw).unwrap_or_else(|| {
            warn!("Limit cell holds non-numeric value {:?}, using fallback", raw);
            fallback
        }),
        Ok(None) => fallback,
        Err(e) => {
            warn!("Failed to read limit cell, using fallback: {:#}", e);
            fallback
        }
    }
}

/// Write a new monthly limit. Unlike reads, failures propagate — the
/// set-limit reply must report success or failure accurately.
pub async fn set_limit(store: &dyn ExpenseStore, value: i64) -> Result<()> {
    store
        .write_limit_cell(&value.to_string())
        .await
        .context("failed to write limit cell")
}

/// Parse an amount as stored in the sheet, tolerating comma thousands
/// separators and surrounding whitespace ("9,500,000").
fn parse_stored_amount(raw: &str) -> Option<i64> {
    raw.replace(',', "").trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExpenseRow;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Minimal in-memory store for ledger tests
    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<Vec<ExpenseRow>>,
        limit: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ExpenseStore for FakeStore {
        async fn append(&self, row: ExpenseRow) -> Result<()> {
            self.rows.lock().unwrap().push(row);
            Ok(())
        }
        async fn all_rows(&self) -> Result<Vec<ExpenseRow>> {
            Ok(self.rows.lock().unwrap().clone())
        }
        async fn read_limit_cell(&self) -> Result<Option<String>> {
            Ok(self.limit.lock().unwrap().clone())
        }
        async fn write_limit_cell(&self, value: &str) -> Result<()> {
            *self.limit.lock().unwrap() = Some(value.to_string());
            Ok(())
        }
    }

    /// Store whose every operation fails, for fallback paths
    struct BrokenStore;

    #[async_trait]
    impl ExpenseStore for BrokenStore {
        async fn append(&self, _row: ExpenseRow) -> Result<()> {
            Err(anyhow!("store unreachable"))
        }
        async fn all_rows(&self) -> Result<Vec<ExpenseRow>> {
            Err(anyhow!("store unreachable"))
        }
        async fn read_limit_cell(&self) -> Result<Option<String>> {
            Err(anyhow!("store unreachable"))
        }
        async fn write_limit_cell(&self, _value: &str) -> Result<()> {
            Err(anyhow!("store unreachable"))
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn row(ts: &str, amount: &str, chat_id: &str) -> ExpenseRow {
        ExpenseRow {
            timestamp: ts.to_string(),
            amount: amount.to_string(),
            category: "khac".to_string(),
            note: String::new(),
            chat_id: chat_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sum_empty_store() {
        let store = FakeStore::default();
        let total = sum_period(&store, "1", Period::Month, now()).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_sum_filters_scope_and_period() {
        let store = FakeStore::default();
        store.append(row("2024-03-01 09:00:00", "100", "1")).await.unwrap();
        store.append(row("2024-03-10 09:00:00", "200", "1")).await.unwrap();
        // same period, different chat
        store.append(row("2024-03-10 09:00:00", "400", "2")).await.unwrap();
        // same chat, previous month
        store.append(row("2024-02-10 09:00:00", "800", "1")).await.unwrap();

        let total = sum_period(&store, "1", Period::Month, now()).await.unwrap();
        assert_eq!(total, 300);

        let quarter = sum_period(&store, "1", Period::Quarter, now()).await.unwrap();
        assert_eq!(quarter, 1100);
    }

    #[tokio::test]
    async fn test_sum_skips_malformed_rows() {
        let store = FakeStore::default();
        store.append(row("not a date", "100", "1")).await.unwrap();
        store.append(row("2024-03-10 09:00:00", "abc", "1")).await.unwrap();
        store.append(row("2024-03-10 09:00:00", "1,500", "1")).await.unwrap();

        let total = sum_period(&store, "1", Period::Month, now()).await.unwrap();
        assert_eq!(total, 1500);
    }

    #[tokio::test]
    async fn test_sum_round_trip() {
        let store = FakeStore::default();
        let row = ExpenseRow::new(now(), 35000, "drink", "ca phe 35k #drink", "1");
        store.append(row).await.unwrap();
        let total = sum_period(&store, "1", Period::Week, now()).await.unwrap();
        assert_eq!(total, 35000);
    }

    #[tokio::test]
    async fn test_limit_fallback_on_unreachable_store() {
        assert_eq!(monthly_limit(&BrokenStore, 9_000_000).await, 9_000_000);
    }

    #[tokio::test]
    async fn test_limit_fallback_on_bad_cell() {
        let store = FakeStore::default();
        assert_eq!(monthly_limit(&store, 9_000_000).await, 9_000_000);
        store.write_limit_cell("not a number").await.unwrap();
        assert_eq!(monthly_limit(&store, 9_000_000).await, 9_000_000);
    }

    #[tokio::test]
    async fn test_limit_reads_comma_formatted_cell() {
        let store = FakeStore::default();
        store.write_limit_cell(" 9,500,000 ").await.unwrap();
        assert_eq!(monthly_limit(&store, 9_000_000).await, 9_500_000);
    }

    #[tokio::test]
    async fn test_set_limit_round_trip() {
        let store = FakeStore::default();
        set_limit(&store, 7_500_000).await.unwrap();
        assert_eq!(monthly_limit(&store, 9_000_000).await, 7_500_000);
    }

    #[tokio::test]
    async fn test_set_limit_surfaces_failure() {
        assert!(set_limit(&BrokenStore, 1).await.is_err());
    }
}
