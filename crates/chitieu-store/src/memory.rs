//! In-memory store backend
//!
//! Backs the end-to-end tests and local dry runs. Same contract as the
//! Sheets backend: insertion-ordered rows, one limit cell.

use anyhow::Result;
use async_trait::async_trait;
use chitieu_core::{ExpenseRow, ExpenseStore};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemStore {
    rows: RwLock<Vec<ExpenseRow>>,
    limit_cell: RwLock<Option<String>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExpenseStore for MemStore {
    async fn append(&self, row: ExpenseRow) -> Result<()> {
        self.rows.write().await.push(row);
        Ok(())
    }

    async fn all_rows(&self) -> Result<Vec<ExpenseRow>> {
        Ok(self.rows.read().await.clone())
    }

    async fn read_limit_cell(&self) -> Result<Option<String>> {
        Ok(self.limit_cell.read().await.clone())
    }

    async fn write_limit_cell(&self, value: &str) -> Result<()> {
        *self.limit_cell.write().await = Some(value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chitieu_core::{Bot, Dispatch, IncomingMessage};
    use std::sync::Arc;

    const FALLBACK_LIMIT: i64 = 9_000_000;

    fn bot(store: Arc<MemStore>, allowed: Vec<String>) -> Bot {
        Bot::new(store, allowed, FALLBACK_LIMIT)
    }

    fn msg(chat_id: &str, text: &str) -> IncomingMessage {
        IncomingMessage {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
        }
    }

    fn reply(dispatch: Dispatch) -> String {
        match dispatch {
            Dispatch::Reply(text) => text,
            Dispatch::Forbidden => panic!("expected a reply, got Forbidden"),
        }
    }

    #[tokio::test]
    async fn test_record_expense_persists_and_confirms() {
        let store = Arc::new(MemStore::new());
        let bot = bot(store.clone(), vec!["12345".to_string()]);

        let out = bot.handle(&msg("12345", "ca phe 35k #drink")).await.unwrap();
        let text = reply(out);
        assert!(text.contains("35,000"), "reply was: {}", text);
        assert!(text.contains("#drink"));

        let rows = store.all_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, "35000");
        assert_eq!(rows[0].category, "drink");
        assert_eq!(rows[0].note, "ca phe 35k #drink");
        assert_eq!(rows[0].chat_id, "12345");
    }

    #[tokio::test]
    async fn test_unparsable_message_not_persisted() {
        let store = Arc::new(MemStore::new());
        let bot = bot(store.clone(), Vec::new());

        let out = bot.handle(&msg("1", "hom nay troi dep")).await.unwrap();
        let text = reply(out);
        assert!(text.contains("chưa thấy số tiền"), "reply was: {}", text);
        assert!(store.all_rows().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_limit_then_month_report_shows_it() {
        let store = Arc::new(MemStore::new());
        let bot = bot(store.clone(), Vec::new());

        let out = bot.handle(&msg("1", "hanmuc 9500000")).await.unwrap();
        assert!(reply(out).contains("9,500,000"));

        let out = bot.handle(&msg("1", "baocao thang")).await.unwrap();
        let text = reply(out);
        assert!(text.contains("9,500,000"), "reply was: {}", text);
        assert!(text.contains("Hạn mức tháng"));
    }

    #[tokio::test]
    async fn test_report_sums_recorded_amounts_exactly() {
        let store = Arc::new(MemStore::new());
        let bot = bot(store.clone(), Vec::new());

        reply(bot.handle(&msg("1", "an trua 75k #food")).await.unwrap());
        reply(bot.handle(&msg("1", "mua sach 120000 #education")).await.unwrap());
        // another chat's expense must not leak into the report
        reply(bot.handle(&msg("2", "an toi 999k")).await.unwrap());

        let out = bot.handle(&msg("1", "baocao tuan")).await.unwrap();
        let text = reply(out);
        assert!(text.contains("195,000"), "reply was: {}", text);
        assert!(text.contains("tuan"));
    }

    #[tokio::test]
    async fn test_weekly_report_omits_limit() {
        let store = Arc::new(MemStore::new());
        let bot = bot(store, Vec::new());
        let text = reply(bot.handle(&msg("1", "baocao tuan")).await.unwrap());
        assert!(!text.contains("Hạn mức"));
    }

    #[tokio::test]
    async fn test_over_limit_warning() {
        let store = Arc::new(MemStore::new());
        let bot = bot(store, Vec::new());

        reply(bot.handle(&msg("1", "hanmuc 100000")).await.unwrap());
        let text = reply(bot.handle(&msg("1", "mua do 150k")).await.unwrap());
        assert!(text.contains("ĐÃ VƯỢT"), "reply was: {}", text);

        // a small expense under a fresh limit carries no warning
        let store = Arc::new(MemStore::new());
        let bot = Bot::new(store, Vec::new(), FALLBACK_LIMIT);
        let text = reply(bot.handle(&msg("1", "ca phe 35k")).await.unwrap());
        assert!(!text.contains("ĐÃ VƯỢT"));
    }

    #[tokio::test]
    async fn test_allow_list_forbids_unknown_chat() {
        let store = Arc::new(MemStore::new());
        let bot = bot(store.clone(), vec!["12345".to_string()]);

        let out = bot.handle(&msg("99999", "ca phe 35k")).await.unwrap();
        assert_eq!(out, Dispatch::Forbidden);
        assert!(store.all_rows().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_help_shows_current_limit() {
        let store = Arc::new(MemStore::new());
        let bot = bot(store, Vec::new());
        let text = reply(bot.handle(&msg("1", "/start")).await.unwrap());
        assert!(text.contains("9,000,000"), "reply was: {}", text);

        let store = Arc::new(MemStore::new());
        let bot = Bot::new(store, Vec::new(), FALLBACK_LIMIT);
        let text = reply(bot.handle(&msg("1", "HELP")).await.unwrap());
        assert!(text.contains("baocao"));
    }

    #[tokio::test]
    async fn test_set_limit_without_number() {
        let store = Arc::new(MemStore::new());
        let bot = bot(store.clone(), Vec::new());
        let text = reply(bot.handle(&msg("1", "hanmuc nhieu tien")).await.unwrap());
        assert!(text.contains("Không tìm thấy số"));
        assert_eq!(store.read_limit_cell().await.unwrap(), None);
    }
}
