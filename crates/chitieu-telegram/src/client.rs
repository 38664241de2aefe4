//! Telegram Bot API client

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Thin client over the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    token: String,
    base_url: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Mask the bot token in debug output
        let masked = if self.token.len() > 7 {
            format!("{}...", &self.token[..4])
        } else {
            "***".to_string()
        };
        f.debug_struct("TelegramClient")
            .field("token", &masked)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        let client = Client::builder()
            // long polls pass their own timeout; 50s covers a 30s poll
            .timeout(Duration::from_secs(50))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            token,
            base_url: TELEGRAM_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API host (tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Call a Bot API method and unwrap Telegram's `{"ok":..,"result":..}`
    /// envelope.
    async fn call(&self, method: &str, payload: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;
        if !status.is_success() || body.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let description = body
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            return Err(anyhow!("Telegram API error ({}): {}", status, description));
        }
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Send a text message; failures propagate to the caller.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        self.call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await?;
        debug!("Sent message to chat {}", chat_id);
        Ok(())
    }

    /// Best-effort send: log and swallow failures. Replies are
    /// fire-and-forget — a delivery problem must never fail the code path
    /// that produced the reply, and is never retried. Anything that has to
    /// be reliable goes through `send_message` instead.
    pub async fn notify(&self, chat_id: &str, text: &str) {
        if let Err(e) = self.send_message(chat_id, text).await {
            warn!("Failed to deliver reply to chat {}: {:#}", chat_id, e);
        }
    }

    /// Long-poll for updates newer than `offset` (already-confirmed cursor).
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Value>> {
        let result = self
            .call(
                "getUpdates",
                json!({ "offset": offset, "timeout": timeout_secs }),
            )
            .await?;
        Ok(result.as_array().cloned().unwrap_or_default())
    }
}
