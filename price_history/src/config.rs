//! Run configuration: TOML file, defaults, validation and environment overrides.
//!
//! The file is parsed into [`ConfigFile`] (every section optional, unknown keys rejected)
//! and then validated into an [`AppConfig`], the only configuration value the rest of the
//! crate sees. There is no global configuration state; the binary threads an `AppConfig`
//! into the pipeline explicitly.
//!
//! Environment:
//! - `DATABASE_URL` overrides `store.database_url`.
//! - `ALPHAVANTAGE_API_KEY` holds the provider credential (see [`AppConfig::provider`]).

use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::{Path, PathBuf},
    time::Duration,
};

use bar_provider::providers::{
    ProviderInitError,
    alpha_vantage::{AlphaVantageProvider, AlphaVantageSettings, OutputSize},
};
use serde::Deserialize;
use shared_utils::env::optional_env_var;
use tracing::warn;

use crate::{
    indicators::{IndicatorConfig, PeriodSet},
    pipeline::retry::RetryPolicy,
};

/// Environment variable overriding `store.database_url`.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("[indicators].{family}_periods contains 0; periods must be positive")]
    InvalidPeriod { family: &'static str },

    #[error("[run].concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("[provider].requests_per_minute must be at least 1")]
    InvalidRateLimit,

    #[error("[provider].timeout_secs must be at least 1")]
    InvalidTimeout,

    #[error("provider credential: {0}")]
    Credential(#[from] ProviderInitError),
}

/// On-disk shape of the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ConfigFile {
    pub provider: ProviderSection,
    pub store: StoreSection,
    pub indicators: IndicatorSection,
    pub run: RunSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProviderSection {
    pub base_url: String,
    pub output_size: OutputSize,
    pub requests_per_minute: u32,
    pub timeout_secs: u64,
}

impl Default for ProviderSection {
    fn default() -> Self {
        let d = AlphaVantageSettings::default();
        Self {
            base_url: d.base_url,
            output_size: d.output_size,
            requests_per_minute: d.requests_per_minute.get(),
            timeout_secs: d.timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StoreSection {
    pub database_url: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            database_url: "price_history.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IndicatorSection {
    pub sma_periods: Vec<usize>,
    pub ema_periods: Vec<usize>,
}

impl Default for IndicatorSection {
    fn default() -> Self {
        Self {
            sma_periods: vec![20, 50, 200],
            ema_periods: vec![12, 26],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RunSection {
    pub concurrency: usize,
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RunSection {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            concurrency: 4,
            max_retries: retry.max_retries,
            base_delay_ms: retry.base_delay.as_millis() as u64,
        }
    }
}

/// How a run schedules its per-symbol work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Fetches allowed in flight at once.
    pub concurrency: NonZeroUsize,
    pub retry: RetryPolicy,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: AlphaVantageSettings,
    pub database_url: String,
    pub indicators: IndicatorConfig,
    pub run: RunSettings,
}

impl ConfigFile {
    /// Validates the file contents. `database_url_override` wins over `store.database_url`.
    pub fn into_app_config(
        self,
        database_url_override: Option<String>,
    ) -> Result<AppConfig, ConfigError> {
        let requests_per_minute = NonZeroU32::new(self.provider.requests_per_minute)
            .ok_or(ConfigError::InvalidRateLimit)?;
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        let concurrency =
            NonZeroUsize::new(self.run.concurrency).ok_or(ConfigError::InvalidConcurrency)?;

        let sma_periods = PeriodSet::new(self.indicators.sma_periods)
            .map_err(|_| ConfigError::InvalidPeriod { family: "sma" })?;
        let ema_periods = PeriodSet::new(self.indicators.ema_periods)
            .map_err(|_| ConfigError::InvalidPeriod { family: "ema" })?;

        Ok(AppConfig {
            provider: AlphaVantageSettings {
                base_url: self.provider.base_url,
                output_size: self.provider.output_size,
                requests_per_minute,
                timeout: Duration::from_secs(self.provider.timeout_secs),
            },
            database_url: database_url_override.unwrap_or(self.store.database_url),
            indicators: IndicatorConfig {
                sma_periods,
                ema_periods,
            },
            run: RunSettings {
                concurrency,
                retry: RetryPolicy {
                    max_retries: self.run.max_retries,
                    base_delay: Duration::from_millis(self.run.base_delay_ms),
                },
            },
        })
    }
}

impl AppConfig {
    /// Builds the Alpha Vantage client from these settings and `ALPHAVANTAGE_API_KEY`.
    ///
    /// Fails before any network activity if the key is missing or still the placeholder.
    pub fn provider(&self) -> Result<AlphaVantageProvider, ConfigError> {
        Ok(AlphaVantageProvider::from_env(self.provider.clone())?)
    }
}

/// Parses and validates a TOML string, without environment overrides.
pub fn load_config_str(s: &str) -> Result<AppConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(s)?;
    file.into_app_config(None)
}

/// Reads `path` and applies the `DATABASE_URL` override.
///
/// A missing file is not an error: the built-in defaults are used instead.
pub fn load_config_path(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let file = match std::fs::read_to_string(path) {
        Ok(s) => toml::from_str(&s)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Config file not found, using defaults");
            ConfigFile::default()
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    file.into_app_config(optional_env_var(DATABASE_URL_ENV))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = load_config_str("").unwrap();
        assert_eq!(cfg.database_url, "price_history.db");
        assert_eq!(cfg.provider.output_size, OutputSize::Full);
        assert_eq!(cfg.provider.requests_per_minute.get(), 5);
        assert_eq!(cfg.run.concurrency.get(), 4);
        assert_eq!(cfg.run.retry, RetryPolicy::default());
        assert_eq!(
            cfg.indicators.sma_periods.iter().collect::<Vec<_>>(),
            vec![20, 50, 200]
        );
        assert_eq!(
            cfg.indicators.ema_periods.iter().collect::<Vec<_>>(),
            vec![12, 26]
        );
    }

    #[test]
    fn full_file_parses() {
        let cfg = load_config_str(
            r#"
            [provider]
            base_url = "http://localhost:9999/query"
            output_size = "compact"
            requests_per_minute = 75
            timeout_secs = 5

            [store]
            database_url = "sqlite://data/prices.db"

            [indicators]
            sma_periods = [10, 10, 30]
            ema_periods = []

            [run]
            concurrency = 2
            max_retries = 0
            base_delay_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(cfg.provider.base_url, "http://localhost:9999/query");
        assert_eq!(cfg.provider.output_size, OutputSize::Compact);
        assert_eq!(cfg.provider.timeout, Duration::from_secs(5));
        assert_eq!(cfg.database_url, "sqlite://data/prices.db");
        assert_eq!(
            cfg.indicators.sma_periods.iter().collect::<Vec<_>>(),
            vec![10, 30]
        );
        assert!(cfg.indicators.ema_periods.is_empty());
        assert_eq!(cfg.run.retry.max_retries, 0);
        assert_eq!(cfg.run.retry.base_delay, Duration::from_millis(50));
    }

    #[test]
    fn database_override_wins() {
        let file: ConfigFile = toml::from_str("[store]\ndatabase_url = \"a.db\"").unwrap();
        let cfg = file.into_app_config(Some("b.db".into())).unwrap();
        assert_eq!(cfg.database_url, "b.db");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = load_config_str("[store]\nuniverse = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            load_config_str("[indicators]\nema_periods = [12, 0]"),
            Err(ConfigError::InvalidPeriod { family: "ema" })
        ));
        assert!(matches!(
            load_config_str("[run]\nconcurrency = 0"),
            Err(ConfigError::InvalidConcurrency)
        ));
        assert!(matches!(
            load_config_str("[provider]\nrequests_per_minute = 0"),
            Err(ConfigError::InvalidRateLimit)
        ));
        assert!(matches!(
            load_config_str("[provider]\ntimeout_secs = 0"),
            Err(ConfigError::InvalidTimeout)
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.run.concurrency.get(), 4);
    }
}
