//! Calendar-period membership predicates
//!
//! Weeks follow ISO-8601 (Monday start, week 1 holds the first Thursday), so
//! `same_week` compares the ISO week-year rather than the calendar year —
//! late-December and early-January days can share a week.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Reporting period for spending totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Quarter,
}

impl Period {
    /// Pick the period named anywhere in a report command; month is the
    /// default ("baocao" / "baocao thang").
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("tuan") {
            Self::Week
        } else if lower.contains("quy") {
            Self::Quarter
        } else {
            Self::Month
        }
    }

    /// Vietnamese keyword used in replies ("Tổng chi tuan này").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Week => "tuan",
            Self::Month => "thang",
            Self::Quarter => "quy",
        }
    }

    /// Whether two timestamps fall in the same instance of this period.
    pub fn contains(&self, d1: NaiveDateTime, d2: NaiveDateTime) -> bool {
        match self {
            Self::Week => same_week(d1, d2),
            Self::Month => same_month(d1, d2),
            Self::Quarter => same_quarter(d1, d2),
        }
    }
}

/// Equal ISO week number and ISO week-year.
pub fn same_week(d1: NaiveDateTime, d2: NaiveDateTime) -> bool {
    let (w1, w2) = (d1.iso_week(), d2.iso_week());
    w1.week() == w2.week() && w1.year() == w2.year()
}

/// Equal calendar month and year.
pub fn same_month(d1: NaiveDateTime, d2: NaiveDateTime) -> bool {
    d1.month() == d2.month() && d1.year() == d2.year()
}

/// Equal quarter (months 1-3, 4-6, 7-9, 10-12) and year.
pub fn same_quarter(d1: NaiveDateTime, d2: NaiveDateTime) -> bool {
    (d1.month0() / 3) == (d2.month0() / 3) && d1.year() == d2.year()
}
