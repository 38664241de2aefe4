//! Command dispatcher
//!
//! One incoming message produces at most one reply. Commands:
//! - `/start` or `help` — usage text with the current limit
//! - `hanmuc <n>` — change the monthly limit
//! - `baocao [tuan|thang|quy]` — spending total for the period
//! - anything else — record an expense, warning when the month runs over
//!   the limit
//!
//! There is no session state; every message is handled independently.

use crate::ledger;
use crate::parse;
use crate::period::Period;
use crate::store::ExpenseStore;
use crate::types::{ExpenseRow, IncomingMessage};
use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of dispatching one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Send this text back to the chat
    Reply(String),
    /// Chat is not on the allow-list. No reply is ever sent in-band; the
    /// transport decides how to express the rejection (403 on the webhook,
    /// a log line on the poller).
    Forbidden,
}

/// The expense bot: allow-list gate plus command dispatch over a store.
pub struct Bot {
    store: Arc<dyn ExpenseStore>,
    /// Chat ids permitted to use the bot; empty means unrestricted
    allowed_chats: Vec<String>,
    fallback_limit: i64,
}

impl Bot {
    pub fn new(store: Arc<dyn ExpenseStore>, allowed_chats: Vec<String>, fallback_limit: i64) -> Self {
        Self {
            store,
            allowed_chats,
            fallback_limit,
        }
    }

    /// Handle one message and produce its reply.
    pub async fn handle(&self, msg: &IncomingMessage) -> Result<Dispatch> {
        if !self.allowed_chats.is_empty() && !self.allowed_chats.contains(&msg.chat_id) {
            warn!("Rejecting message from chat {} (not on allow-list)", msg.chat_id);
            return Ok(Dispatch::Forbidden);
        }

        let text = msg.text.trim();
        let lower = text.to_lowercase();

        let reply = if lower.starts_with("/start") || lower == "help" {
            self.help_text().await
        } else if lower.starts_with("hanmuc") {
            self.set_limit_command(text).await
        } else if lower.starts_with("baocao") {
            self.report_command(&msg.chat_id, text).await?
        } else {
            self.record_expense(&msg.chat_id, text).await?
        };

        Ok(Dispatch::Reply(reply))
    }

    async fn help_text(&self) -> String {
        let limit = ledger::monthly_limit(self.store.as_ref(), self.fallback_limit).await;
        format!(
            "Xin chào! Gõ ví dụ: 'ăn trưa 75k #food'\n\
             - Báo cáo: 'baocao tuan|thang|quy'\n\
             - Đổi hạn mức: 'hanmuc 9500000'\n\
             - Hạn mức hiện tại: {}đ",
            parse::format_amount(limit)
        )
    }

    async fn set_limit_command(&self, text: &str) -> String {
        let Some(new_limit) = parse::first_number(text) else {
            return "❌ Không tìm thấy số. Dùng: hanmuc 9500000".to_string();
        };
        match ledger::set_limit(self.store.as_ref(), new_limit).await {
            Ok(()) => {
                info!("Monthly limit updated to {}", new_limit);
                format!(
                    "✅ Đã cập nhật hạn mức tháng: {}đ",
                    parse::format_amount(new_limit)
                )
            }
            Err(e) => {
                warn!("Failed to update limit: {:#}", e);
                "❌ Không lưu được hạn mức, thử lại sau.".to_string()
            }
        }
    }

    async fn report_command(&self, chat_id: &str, text: &str) -> Result<String> {
        let period = Period::from_text(text);
        let now = Local::now().naive_local();
        let total = ledger::sum_period(self.store.as_ref(), chat_id, period, now).await?;

        let mut reply = format!(
            "📊 Tổng chi {} này: {}đ",
            period.label(),
            parse::format_amount(total)
        );
        if period == Period::Month {
            let limit = ledger::monthly_limit(self.store.as_ref(), self.fallback_limit).await;
            reply.push_str(&format!("\nHạn mức tháng: {}đ", parse::format_amount(limit)));
        }
        Ok(reply)
    }

    async fn record_expense(&self, chat_id: &str, text: &str) -> Result<String> {
        let parsed = parse::extract(text);
        let Some(amount) = parsed.amount else {
            return Ok("❌ Mình chưa thấy số tiền. Ví dụ: 'cà phê 35k #drink'".to_string());
        };

        let now = Local::now().naive_local();
        let row = ExpenseRow::new(now, amount, &parsed.category, &parsed.note, chat_id);
        self.store.append(row).await?;
        info!("Recorded {}đ #{} for chat {}", amount, parsed.category, chat_id);

        let month_total =
            ledger::sum_period(self.store.as_ref(), chat_id, Period::Month, now).await?;
        let limit = ledger::monthly_limit(self.store.as_ref(), self.fallback_limit).await;

        let mut reply = format!(
            "✅ Đã ghi: {}đ #{}",
            parse::format_amount(amount),
            parsed.category
        );
        if month_total > limit {
            reply.push_str(&format!(
                "\n⚠️ ĐÃ VƯỢT hạn mức {}đ trong tháng!",
                parse::format_amount(limit)
            ));
        }
        Ok(reply)
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("allowed_chats", &self.allowed_chats)
            .field("fallback_limit", &self.fallback_limit)
            .finish()
    }
}
