//! Google Sheets backend
//!
//! Rows live on an expense tab with a header row, columns
//! `[timestamp, amount, category, note, chat_id]`; the monthly limit lives in
//! a single cell of a config tab. Talks to the Sheets REST API v4 with a
//! bearer access token supplied by configuration — minting and refreshing
//! the token is the deployment's job, not this crate's.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chitieu_core::{ExpenseRow, ExpenseStore};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Failures reported by the Sheets API itself (as opposed to local ones).
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sheets API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Connection settings for one spreadsheet.
#[derive(Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub access_token: String,
    /// Tab holding expense rows (header row expected)
    pub expense_tab: String,
    /// Tab holding the config cells
    pub config_tab: String,
    /// Cell address of the monthly limit, e.g. "B1"
    pub limit_cell: String,
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("access_token", &"***")
            .field("expense_tab", &self.expense_tab)
            .field("config_tab", &self.config_tab)
            .field("limit_cell", &self.limit_cell)
            .finish()
    }
}

/// Google Sheets row store
#[derive(Debug)]
pub struct SheetsStore {
    client: Client,
    config: SheetsConfig,
    base_url: String,
}

impl SheetsStore {
    pub fn new(config: SheetsConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            config,
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    /// Point the store at a different API host (tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url, self.config.spreadsheet_id, range
        )
    }

    fn limit_range(&self) -> String {
        format!("{}!{}", self.config.config_tab, self.config.limit_cell)
    }

    async fn check(response: reqwest::Response) -> Result<Value, SheetsError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn get_range(&self, range: &str) -> Result<Value, SheetsError> {
        let response = self
            .client
            .get(self.values_url(range))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;
        Self::check(response).await
    }
}

/// Decode one sheet row; missing trailing cells become empty strings.
fn row_from_values(cells: &[Value]) -> ExpenseRow {
    let cell = |i: usize| -> String {
        cells
            .get(i)
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default()
    };
    ExpenseRow {
        timestamp: cell(0),
        amount: cell(1),
        category: cell(2),
        note: cell(3),
        chat_id: cell(4),
    }
}

#[async_trait]
impl ExpenseStore for SheetsStore {
    async fn append(&self, row: ExpenseRow) -> Result<()> {
        let url = format!(
            "{}:append?valueInputOption=USER_ENTERED",
            self.values_url(&self.config.expense_tab)
        );
        let body = json!({
            "values": [[row.timestamp, row.amount, row.category, row.note, row.chat_id]],
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await
            .map_err(SheetsError::from)?;
        Self::check(response)
            .await
            .context("failed to append expense row")?;
        debug!("Appended row to tab {}", self.config.expense_tab);
        Ok(())
    }

    async fn all_rows(&self) -> Result<Vec<ExpenseRow>> {
        let body = self
            .get_range(&self.config.expense_tab)
            .await
            .context("failed to fetch expense rows")?;
        let values = match body.get("values").and_then(|v| v.as_array()) {
            Some(v) => v,
            None => return Ok(Vec::new()), // empty tab
        };
        // first row is the header
        let rows = values
            .iter()
            .skip(1)
            .filter_map(|r| r.as_array())
            .map(|cells| row_from_values(cells))
            .collect();
        Ok(rows)
    }

    async fn read_limit_cell(&self) -> Result<Option<String>> {
        let body = self
            .get_range(&self.limit_range())
            .await
            .context("failed to read limit cell")?;
        let value = body
            .get("values")
            .and_then(|v| v.as_array())
            .and_then(|rows| rows.first())
            .and_then(|r| r.as_array())
            .and_then(|cells| cells.first())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        Ok(value)
    }

    async fn write_limit_cell(&self, value: &str) -> Result<()> {
        let url = format!(
            "{}?valueInputOption=RAW",
            self.values_url(&self.limit_range())
        );
        let body = json!({ "values": [[value]] });
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await
            .map_err(SheetsError::from)?;
        Self::check(response)
            .await
            .context("failed to write limit cell")?;
        Ok(())
    }
}
