use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;
use snafu::{ResultExt, ensure};

use crate::{
    models::bar::{DailySeries, RawBar},
    providers::{
        DecodeSnafu, EmptySeriesSnafu, MalformedBarSnafu, MissingTimeSeriesSnafu, ProviderError,
    },
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One day inside `"Time Series (Daily)"`. The vendor sends every number as a string.
#[derive(Deserialize, Debug)]
pub struct AlphaVantageDay {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume", default)]
    pub volume: Option<String>,
}

/// The whole `TIME_SERIES_DAILY` envelope.
///
/// Throttling and bad tickers come back as HTTP 200 with one of the message keys
/// instead of the time series, so every field is optional here. `"Meta Data"` is
/// ignored; the requested symbol is authoritative.
#[derive(Deserialize, Debug)]
pub struct AlphaVantageResponse {
    #[serde(rename = "Time Series (Daily)")]
    pub time_series: Option<IndexMap<String, AlphaVantageDay>>,
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Information")]
    pub information: Option<String>,
}

impl AlphaVantageResponse {
    /// The provider's own explanation for a missing series, if it gave one.
    fn explanation(&self) -> String {
        self.error_message
            .as_deref()
            .or(self.note.as_deref())
            .or(self.information.as_deref())
            .unwrap_or(
                "the API response might have changed, the ticker is invalid or the API limit was reached",
            )
            .to_string()
    }

    /// Converts the envelope into canonical bars, rejecting the whole payload on any bad day.
    pub fn into_daily_series(self, symbol: &str) -> Result<DailySeries, ProviderError> {
        let explanation = self.explanation();
        let Some(series) = self.time_series else {
            return MissingTimeSeriesSnafu {
                symbol,
                message: explanation,
            }
            .fail();
        };
        ensure!(!series.is_empty(), EmptySeriesSnafu { symbol });

        let bars = series
            .into_iter()
            .map(|(date, day)| day.into_raw_bar(symbol, &date))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DailySeries::new(symbol, bars))
    }
}

impl AlphaVantageDay {
    fn into_raw_bar(self, symbol: &str, date: &str) -> Result<RawBar, ProviderError> {
        let parsed_date = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| {
            MalformedBarSnafu {
                symbol,
                date,
                field: "date",
                value: date,
            }
            .build()
        })?;

        let volume = match self.volume.as_deref() {
            Some(raw) => Some(parse_price(symbol, date, "5. volume", raw)?),
            None => None,
        };

        Ok(RawBar {
            date: parsed_date,
            open: parse_price(symbol, date, "1. open", &self.open)?,
            high: parse_price(symbol, date, "2. high", &self.high)?,
            low: parse_price(symbol, date, "3. low", &self.low)?,
            close: parse_price(symbol, date, "4. close", &self.close)?,
            volume,
        })
    }
}

fn parse_price(
    symbol: &str,
    date: &str,
    field: &'static str,
    raw: &str,
) -> Result<f64, ProviderError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            MalformedBarSnafu {
                symbol,
                date,
                field,
                value: raw,
            }
            .build()
        })
}

/// Parses a raw response body for `symbol`.
pub fn parse_body(symbol: &str, body: &str) -> Result<DailySeries, ProviderError> {
    let response: AlphaVantageResponse =
        serde_json::from_str(body).context(DecodeSnafu { symbol })?;
    response.into_daily_series(symbol)
}
