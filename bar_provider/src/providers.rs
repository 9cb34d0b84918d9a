//! Provider abstraction for daily market data sources.
//!
//! This module defines the [`DataProvider`] trait, which serves as a unified interface
//! for fetching the daily bar history of one symbol from any market data vendor.
//!
//! Each concrete provider (such as [`alpha_vantage::AlphaVantageProvider`]) handles the
//! vendor-specific request and envelope parsing and hands back a [`DailySeries`].
//!
//! The trait is designed for async usage and supports dynamic dispatch (`dyn DataProvider`)
//! so the pipeline can be driven by a stub in tests.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use bar_provider::models::bar::DailySeries;
//! use bar_provider::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_daily(&self, symbol: &str) -> Result<DailySeries, ProviderError> {
//!         Ok(DailySeries::new(symbol, vec![]))
//!     }
//! }
//! ```

pub mod alpha_vantage;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::bar::DailySeries;

/// Trait for fetching the daily bar history of a symbol from a market data provider.
#[async_trait]
pub trait DataProvider {
    /// Fetches every daily bar the provider is willing to return for `symbol`.
    ///
    /// # Returns
    ///
    /// * `Ok(DailySeries)` - A non-empty, unordered collection of bars.
    /// * `Err(ProviderError)` - Transport or payload failure; never a partial series.
    async fn fetch_daily(&self, symbol: &str) -> Result<DailySeries, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// The API key still holds the sample value shipped in the docs.
    #[snafu(display("API key is the placeholder {placeholder:?}; set a real key"))]
    PlaceholderApiKey {
        placeholder: String,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Broad failure category, used by callers to decide how to report a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The provider could not be reached or answered with a non-success status.
    Transport,
    /// The provider answered but the payload was not the expected time series.
    Schema,
    /// The request itself was rejected before being sent.
    Request,
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider answered with a non-success HTTP status.
    #[snafu(display("Unexpected HTTP status {status}: {body}"))]
    Status {
        status: u16,
        body: String,
        backtrace: Backtrace,
    },

    /// The body was not JSON of the expected shape.
    #[snafu(display("Could not decode response for {symbol}: {source}"))]
    Decode {
        symbol: String,
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// The time series container was absent (invalid ticker, throttled, changed API).
    #[snafu(display("No daily time series for {symbol}: {message}"))]
    MissingTimeSeries {
        symbol: String,
        message: String,
        backtrace: Backtrace,
    },

    /// The time series container was present but held no days.
    #[snafu(display("Daily time series for {symbol} is empty"))]
    EmptySeries { symbol: String, backtrace: Backtrace },

    /// One day in the payload had an unparseable date or price.
    #[snafu(display("Malformed bar for {symbol} on {date:?}: field {field} = {value:?}"))]
    MalformedBar {
        symbol: String,
        date: String,
        field: &'static str,
        value: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::Reqwest { .. } | ProviderError::Status { .. } => FailureKind::Transport,
            ProviderError::Decode { .. }
            | ProviderError::MissingTimeSeries { .. }
            | ProviderError::EmptySeries { .. }
            | ProviderError::MalformedBar { .. } => FailureKind::Schema,
            ProviderError::Validation { .. } => FailureKind::Request,
        }
    }

    /// Whether repeating the same request later could plausibly succeed.
    ///
    /// Timeouts, connection failures, 429 and 5xx answers are retryable; anything the
    /// provider actively rejected or a payload we could not understand is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Reqwest { source, .. } => source.is_timeout() || source.is_connect(),
            ProviderError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}
