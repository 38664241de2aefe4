use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChitieuConfig {
    pub telegram: TelegramConfig,
    pub sheets: SheetsCliConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
}

/// Which transport delivers updates. Exactly one is active per deployment;
/// running both would double-process every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Webhook,
    Poll,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Chat ids allowed to use the bot. Empty means unrestricted.
    #[serde(default)]
    pub allowed_chat_ids: Vec<String>,
    #[serde(default = "default_transport")]
    pub transport: Transport,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Path secret for the webhook endpoint
    #[serde(default = "default_webhook_secret")]
    pub webhook_secret: String,
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &mask_secret(&self.bot_token))
            .field("allowed_chat_ids", &self.allowed_chat_ids)
            .field("transport", &self.transport)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("webhook_secret", &mask_secret(&self.webhook_secret))
            .field("bind", &self.bind)
            .finish()
    }
}

fn default_transport() -> Transport {
    Transport::Webhook
}
fn default_poll_timeout() -> u64 {
    30
}
fn default_webhook_secret() -> String {
    "secret".to_string()
}
fn default_bind() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default bind address")
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SheetsCliConfig {
    pub spreadsheet_id: String,
    pub access_token: String,
    #[serde(default = "default_expense_tab")]
    pub expense_tab: String,
    #[serde(default = "default_config_tab")]
    pub config_tab: String,
    #[serde(default = "default_limit_cell")]
    pub limit_cell: String,
}

impl std::fmt::Debug for SheetsCliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsCliConfig")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("access_token", &mask_secret(&self.access_token))
            .field("expense_tab", &self.expense_tab)
            .field("config_tab", &self.config_tab)
            .field("limit_cell", &self.limit_cell)
            .finish()
    }
}

fn default_expense_tab() -> String {
    "Chitieu".to_string()
}
fn default_config_tab() -> String {
    "Config".to_string()
}
fn default_limit_cell() -> String {
    "B1".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Used whenever the limit cell is unreadable or empty
    #[serde(default = "default_fallback_limit")]
    pub fallback_monthly_limit: i64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            fallback_monthly_limit: default_fallback_limit(),
        }
    }
}

fn default_fallback_limit() -> i64 {
    9_000_000
}

/// Mask a secret string for safe display in Debug output / logs.
fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "(empty)".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 7 {
        let prefix: String = chars[..3].iter().collect();
        format!("{}...", prefix)
    } else {
        "***".to_string()
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chitieu")
}

impl ChitieuConfig {
    pub fn load(custom_path: &Option<PathBuf>) -> Result<Self> {
        let path = custom_path
            .clone()
            .unwrap_or_else(|| config_dir().join("config.toml"));

        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read config at {}. Run `chitieu init` first.",
                path.display()
            )
        })?;

        // Expand environment variables before parsing
        let expanded = expand_env_vars(&content);
        let config = Self::from_toml(&expanded)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Startup configuration failures are fatal: the process must not start
    /// serving with a missing credential.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            bail!("telegram.bot_token is not set (export TELEGRAM_BOT_TOKEN)");
        }
        if self.sheets.spreadsheet_id.is_empty() {
            bail!("sheets.spreadsheet_id is not set (export GOOGLE_SHEET_KEY)");
        }
        if self.sheets.access_token.is_empty() {
            bail!("sheets.access_token is not set (export GOOGLE_SHEETS_TOKEN)");
        }
        if self.telegram.bot_token.contains(':') && !self.telegram.bot_token.contains("${") {
            // token made it into the file verbatim
            warn!(
                "Bot token is hardcoded in the config file. For security, use: bot_token = \"${{TELEGRAM_BOT_TOKEN}}\""
            );
        }
        Ok(())
    }
}

/// Allowlist of environment variable names that may be expanded in config
/// files. Keeps a writable config from exfiltrating arbitrary env vars.
const ALLOWED_ENV_VARS: &[&str] = &[
    "TELEGRAM_BOT_TOKEN",
    "TELEGRAM_WEBHOOK_SECRET",
    "GOOGLE_SHEET_KEY",
    "GOOGLE_SHEETS_TOKEN",
    "HOME",
    "USER",
];

fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut pos = 0;
    while pos < result.len() {
        if let Some(start) = result[pos..].find("${") {
            let abs_start = pos + start;
            if let Some(end) = result[abs_start..].find('}') {
                let var_name = result[abs_start + 2..abs_start + end].to_string();

                let value = if ALLOWED_ENV_VARS.contains(&var_name.as_str()) {
                    std::env::var(&var_name).unwrap_or_default()
                } else {
                    warn!(
                        "Skipping expansion of unrecognized env var '{}' in config (not in allowlist)",
                        var_name
                    );
                    // Leave the ${VAR} unexpanded so it's obvious
                    pos = abs_start + end + 1;
                    continue;
                };

                let value_len = value.len();
                result = format!(
                    "{}{}{}",
                    &result[..abs_start],
                    value,
                    &result[abs_start + end + 1..]
                );
                pos = abs_start + value_len;
            } else {
                break;
            }
        } else {
            break;
        }
    }
    result
}
