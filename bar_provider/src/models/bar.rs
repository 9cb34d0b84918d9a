//! Canonical in-memory representation of one provider's daily bars (OHLCV).
//!
//! These structs are the output of every [`DataProvider`](crate::providers::DataProvider)
//! implementation and the input of the ingestion pipeline, regardless of vendor.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single trading day as supplied by a provider.
///
/// This struct is vendor-agnostic. Field mapping from the vendor payload is
/// one-to-one: the provider's open/high/low/close land in the same-named fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    /// The trading day this bar describes (exchange calendar date).
    pub date: NaiveDate,

    /// Opening price.
    pub open: f64,

    /// Highest price of the day.
    pub high: f64,

    /// Lowest price of the day.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Shares traded. Not every source variant reports it.
    pub volume: Option<f64>,
}

/// Everything one fetch returned for a single symbol.
///
/// `bars` carries no ordering guarantee and may repeat dates when a provider
/// pages or re-sends data; consumers must not rely on either.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailySeries {
    /// The symbol this data represents (e.g., "AAPL", "IBM").
    pub symbol: String,
    /// The daily bars, in whatever order the provider produced them.
    pub bars: Vec<RawBar>,
}

impl DailySeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<RawBar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }
}
