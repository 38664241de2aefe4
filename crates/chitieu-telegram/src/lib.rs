//! Telegram transport for the chitieu bot
//!
//! Bot API client (sendMessage / getUpdates), update-JSON decoding shared by
//! the webhook and the poller, and the long-polling loop itself.

pub mod client;
pub mod poller;
pub mod update;

pub use client::TelegramClient;
pub use poller::UpdatePoller;
pub use update::{decode_update, update_id};
