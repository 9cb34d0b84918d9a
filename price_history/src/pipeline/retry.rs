use std::time::Duration;

use bar_provider::{
    models::bar::DailySeries,
    providers::{DataProvider, ProviderError},
};
use tracing::warn;

/// Exponential backoff for provider fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Sleep before retry number `attempt + 1`: `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Calls `fetch_daily` until it succeeds, fails with a non-retryable error, or the
/// retry budget runs out. The last error is returned as-is.
pub async fn fetch_with_retry(
    provider: &(dyn DataProvider + Send + Sync),
    symbol: &str,
    policy: RetryPolicy,
) -> Result<DailySeries, ProviderError> {
    let mut attempt = 0;
    loop {
        match provider.fetch_daily(symbol).await {
            Ok(series) => return Ok(series),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                warn!(symbol, attempt = attempt + 1, ?delay, error = %e, "Fetch failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use bar_provider::providers::{MissingTimeSeriesSnafu, StatusSnafu};

    use super::*;

    #[test]
    fn delay_doubles() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(250),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
        // no overflow panic for silly attempt counts
        assert!(policy.delay_for(64) >= policy.delay_for(31));
    }

    /// Fails with `status` for the first `failures` calls.
    struct Flaky {
        calls: AtomicU32,
        failures: u32,
        status: u16,
    }

    #[async_trait]
    impl DataProvider for Flaky {
        async fn fetch_daily(&self, symbol: &str) -> Result<DailySeries, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return StatusSnafu {
                    status: self.status,
                    body: "",
                }
                .fail();
            }
            Ok(DailySeries::new(symbol, vec![]))
        }
    }

    struct Rejecting(AtomicU32);

    #[async_trait]
    impl DataProvider for Rejecting {
        async fn fetch_daily(&self, symbol: &str) -> Result<DailySeries, ProviderError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            MissingTimeSeriesSnafu {
                symbol,
                message: "Invalid API call",
            }
            .fail()
        }
    }

    fn instant(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let provider = Flaky {
            calls: AtomicU32::new(0),
            failures: 2,
            status: 503,
        };
        let series = fetch_with_retry(&provider, "IBM", instant(3)).await.unwrap();
        assert_eq!(series.symbol, "IBM");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let provider = Flaky {
            calls: AtomicU32::new(0),
            failures: 10,
            status: 429,
        };
        let err = fetch_with_retry(&provider, "IBM", instant(2)).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn schema_errors_are_not_retried() {
        let provider = Rejecting(AtomicU32::new(0));
        fetch_with_retry(&provider, "NOPE", instant(5)).await.unwrap_err();
        assert_eq!(provider.0.load(Ordering::SeqCst), 1);
    }
}
