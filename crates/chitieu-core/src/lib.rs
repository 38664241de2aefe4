//! chitieu-core - expense parsing and bookkeeping logic
//!
//! This crate provides:
//! - Free-text extraction of an amount and a #category from a chat message
//! - Calendar predicates for week / month / quarter membership
//! - Period aggregation and the monthly-limit accessor over an `ExpenseStore`
//! - The command dispatcher that turns one incoming message into one reply
//!
//! Transports (webhook, long polling) and store backends live in sibling
//! crates; everything here is independent of where messages come from.

pub mod bot;
pub mod ledger;
pub mod parse;
pub mod period;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use bot::{Bot, Dispatch};
pub use ledger::{monthly_limit, set_limit, sum_period};
pub use parse::{extract, format_amount, Parsed};
pub use period::Period;
pub use store::ExpenseStore;
pub use types::{ExpenseRow, IncomingMessage, TIMESTAMP_FORMAT};
