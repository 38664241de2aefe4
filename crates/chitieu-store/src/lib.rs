//! Store backends for the chitieu bot
//!
//! The production backend talks to the Google Sheets REST API; the in-memory
//! backend backs tests and local experimentation. Both implement
//! `chitieu_core::ExpenseStore`.

pub mod memory;
pub mod sheets;

pub use memory::MemStore;
pub use sheets::{SheetsConfig, SheetsError, SheetsStore};
