use std::{num::NonZeroU32, time::Duration};

use nonzero_ext::nonzero;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// How much history the provider returns per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputSize {
    /// Latest 100 trading days.
    Compact,
    /// The full 20+ year history.
    #[default]
    Full,
}

impl OutputSize {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

/// Connection and pacing knobs for [`AlphaVantageProvider`](super::AlphaVantageProvider).
#[derive(Clone, Debug)]
pub struct AlphaVantageSettings {
    pub base_url: String,
    pub output_size: OutputSize,
    /// Client-side request budget. The free tier allows 5 per minute.
    pub requests_per_minute: NonZeroU32,
    /// Upper bound for a single HTTP round trip, body included.
    pub timeout: Duration,
}

impl Default for AlphaVantageSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_size: OutputSize::Full,
            requests_per_minute: nonzero!(5u32),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Builds the query string for one daily-series request.
pub fn construct_params(
    symbol: &str,
    output_size: OutputSize,
    api_key: &SecretString,
) -> Vec<(&'static str, String)> {
    vec![
        ("function", "TIME_SERIES_DAILY".to_string()),
        ("symbol", symbol.to_string()),
        ("outputsize", output_size.as_str().to_string()),
        ("apikey", api_key.expose_secret().to_string()),
    ]
}

/// Rejects symbols that would produce a meaningless request.
pub fn validate_symbol(symbol: &str) -> Result<(), String> {
    if symbol.trim().is_empty() {
        return Err("symbol cannot be empty".to_string());
    }
    if symbol.chars().any(char::is_whitespace) {
        return Err(format!("symbol {symbol:?} contains whitespace"));
    }
    Ok(())
}
