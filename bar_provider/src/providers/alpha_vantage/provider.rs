use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use snafu::{ResultExt, ensure};
use tracing::{debug, info};

use crate::{
    models::bar::DailySeries,
    providers::{
        ClientBuildSnafu, DataProvider, MissingEnvVarSnafu, PlaceholderApiKeySnafu, ProviderError,
        ProviderInitError, ReqwestSnafu, StatusSnafu, ValidationSnafu,
        alpha_vantage::{
            params::{AlphaVantageSettings, construct_params, validate_symbol},
            response::parse_body,
        },
    },
};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

/// Sample value from the vendor docs and our example config; never a real key.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

pub struct AlphaVantageProvider {
    client: Client,
    api_key: SecretString,
    settings: AlphaVantageSettings,
    limiter: DefaultDirectRateLimiter,
}

impl AlphaVantageProvider {
    /// Creates a new Alpha Vantage provider with an explicit API key.
    pub fn new(
        api_key: SecretString,
        settings: AlphaVantageSettings,
    ) -> Result<Self, ProviderInitError> {
        ensure!(
            api_key.expose_secret().trim() != PLACEHOLDER_API_KEY,
            PlaceholderApiKeySnafu {
                placeholder: PLACEHOLDER_API_KEY
            }
        );

        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context(ClientBuildSnafu)?;
        let limiter = RateLimiter::direct(Quota::per_minute(settings.requests_per_minute));

        Ok(Self {
            client,
            api_key,
            settings,
            limiter,
        })
    }

    /// Creates a new Alpha Vantage provider.
    ///
    /// Reads the API key from the `ALPHAVANTAGE_API_KEY` environment variable.
    pub fn from_env(settings: AlphaVantageSettings) -> Result<Self, ProviderInitError> {
        let api_key = SecretString::new(get_env_var(API_KEY_ENV).context(MissingEnvVarSnafu)?.into());
        Self::new(api_key, settings)
    }
}

#[async_trait]
impl DataProvider for AlphaVantageProvider {
    async fn fetch_daily(&self, symbol: &str) -> Result<DailySeries, ProviderError> {
        validate_symbol(symbol).map_err(|message| ValidationSnafu { message }.build())?;

        // Waits for a slot in the per-minute budget; the vendor answers over-budget
        // calls with a 200 and a "Note" instead of data.
        self.limiter.until_ready().await;

        info!(symbol, "Fetching daily series");
        let query = construct_params(symbol, self.settings.output_size, &self.api_key);
        let response = self
            .client
            .get(&self.settings.base_url)
            .query(&query)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return StatusSnafu {
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        let body = response.text().await.context(ReqwestSnafu)?;
        let series = parse_body(symbol, &body)?;
        debug!(symbol, bars = series.bars.len(), "Parsed daily series");
        Ok(series)
    }
}
