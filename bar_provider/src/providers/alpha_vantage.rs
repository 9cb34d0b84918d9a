//! Alpha Vantage `TIME_SERIES_DAILY` REST provider.
//!
//! - [`params`]: query construction and the tunable [`AlphaVantageSettings`].
//! - [`response`]: the JSON envelope and its conversion into [`RawBar`](crate::models::bar::RawBar)s.
//! - [`provider`]: the [`AlphaVantageProvider`] HTTP client with rate limiting.

pub mod params;
pub mod provider;
pub mod response;

pub use params::{AlphaVantageSettings, OutputSize};
pub use provider::AlphaVantageProvider;
