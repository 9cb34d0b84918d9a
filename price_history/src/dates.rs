//! Trading-date conversion helpers.
//!
//! Dates are stored as ISO-8601 `YYYY-MM-DD` text. That form sorts lexicographically in
//! calendar order, so `ORDER BY trading_date` in SQLite is chronological order.

use anyhow::Context;
use chrono::NaiveDate;

const DB_FORMAT: &str = "%Y-%m-%d";

/// `NaiveDate` -> stored text.
pub fn to_db(date: NaiveDate) -> String {
    date.format(DB_FORMAT).to_string()
}

/// Stored text -> `NaiveDate`.
pub fn from_db(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DB_FORMAT).with_context(|| format!("bad trading_date in store: {s}"))
}
