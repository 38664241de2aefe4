//! Free-text expense extraction
//!
//! Messages look like "an trua 75k #food" or "mua sach 120.000 #education".
//! The first digit run (dots are thousands separators, never decimals) gives
//! the amount, an optional unit token scales it, and the first #tag gives the
//! category.

use regex::Regex;
use std::sync::LazyLock;

/// Category used when a message carries no #tag.
pub const DEFAULT_CATEGORY: &str = "khac";

/// Digit run with optional dot separators, optionally followed by a unit:
/// k/nghìn/ngàn mean "thousand", vnđ/vnd name the currency (no scaling).
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d\.]*)\s*(k|nghìn|ngàn|vnđ|vnd)?").expect("amount pattern")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)#([a-z0-9_\-]+)").expect("tag pattern"));

/// Result of scanning a free-text expense message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    /// `None` means no digit run was found — the message is not an expense.
    pub amount: Option<i64>,
    pub category: String,
    pub note: String,
}

/// Extract amount, category and note from a chat message.
///
/// The note is always the trimmed original text; extraction never rewrites it.
pub fn extract(text: &str) -> Parsed {
    let mut amount = None;

    if let Some(caps) = AMOUNT_RE.captures(text) {
        let digits = caps[1].replace('.', "");
        let unit = caps
            .get(2)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default();
        if let Ok(mut value) = digits.parse::<i64>() {
            if matches!(unit.as_str(), "k" | "nghìn" | "ngàn") {
                value *= 1000;
            }
            amount = Some(value);
        }
    }

    let category = TAG_RE
        .captures(text)
        .map(|caps| caps[1].to_lowercase())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    Parsed {
        amount,
        category,
        note: text.trim().to_string(),
    }
}

/// First digit run in `text` with dot separators stripped, as an integer.
/// Used by the set-limit command ("hanmuc 9.500.000").
pub fn first_number(text: &str) -> Option<i64> {
    let caps = AMOUNT_RE.captures(text)?;
    caps[1].replace('.', "").parse().ok()
}

/// Render an amount with comma thousands separators ("35,000").
pub fn format_amount(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    let first_group = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - first_group) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
