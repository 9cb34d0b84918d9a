//! Run orchestration: fetch, ingest, then compute indicators for each symbol.
//!
//! Fetches run concurrently (bounded by `run.concurrency`, each on its own tokio task
//! with retry and backoff). Everything touching the store runs sequentially on the
//! caller's connection as each fetch completes, so a symbol's indicators are only
//! computed after its whole batch has been committed.
//!
//! The store work is synchronous diesel and runs inline in [`Pipeline::run`], holding
//! the polling worker for the length of each symbol's transactions. The binary uses the
//! multi-thread runtime, so spawned fetches keep progressing on the other workers; on a
//! current-thread runtime they simply wait until the loop awaits the next result.
//!
//! One symbol failing never stops the others; the failure is recorded in the
//! [`RunSummary`] and logged.

pub mod retry;
pub mod summary;

use std::{pin::pin, sync::Arc};

use bar_provider::{
    models::bar::DailySeries,
    providers::{DataProvider, ProviderError},
};
use diesel::SqliteConnection;
use futures::{StreamExt, stream};
use tracing::{error, info, warn};

pub use summary::{RunSummary, Stage, SymbolFailure, SymbolOutcome, SymbolSuccess};

use crate::{
    config::{AppConfig, RunSettings},
    indicators::IndicatorEngine,
    ingest::Ingestor,
    pipeline::retry::fetch_with_retry,
    store::{SeriesRepo, universe},
};

pub struct Pipeline<R> {
    run: RunSettings,
    provider: Arc<dyn DataProvider + Send + Sync>,
    repo: R,
    ingestor: Ingestor<R>,
    engine: IndicatorEngine<R>,
}

impl<R: SeriesRepo + Clone> Pipeline<R> {
    pub fn new(config: &AppConfig, provider: Arc<dyn DataProvider + Send + Sync>, repo: R) -> Self {
        Self {
            run: config.run,
            provider,
            ingestor: Ingestor::new(repo.clone()),
            engine: IndicatorEngine::new(repo.clone(), config.indicators.clone()),
            repo,
        }
    }

    /// Runs every symbol in the ticker universe.
    ///
    /// Failing to read the universe is fatal; per-symbol failures are not.
    pub async fn run_universe(&self, conn: &mut SqliteConnection) -> anyhow::Result<RunSummary> {
        let symbols = universe::list_tickers(conn)?;
        if symbols.is_empty() {
            warn!("Ticker universe is empty; add symbols with `tickers add`");
        }
        Ok(self.run(conn, &symbols).await)
    }

    /// Runs the given symbols. Outcomes are reported in input order.
    pub async fn run(&self, conn: &mut SqliteConnection, symbols: &[String]) -> RunSummary {
        info!(
            symbols = symbols.len(),
            concurrency = self.run.concurrency.get(),
            "Starting run"
        );

        let mut fetches = pin!(
            stream::iter(symbols.iter().cloned().enumerate())
                .map(|(idx, symbol)| {
                    let provider = Arc::clone(&self.provider);
                    let retry = self.run.retry;
                    async move {
                        let task = tokio::spawn({
                            let symbol = symbol.clone();
                            async move { fetch_with_retry(provider.as_ref(), &symbol, retry).await }
                        });
                        let fetched = match task.await {
                            Ok(res) => res.map_err(fetch_failure),
                            Err(join) => Err(SymbolFailure {
                                stage: Stage::Fetch,
                                message: format!("fetch task failed: {join}"),
                                kind: None,
                            }),
                        };
                        (idx, symbol, fetched)
                    }
                })
                .buffer_unordered(self.run.concurrency.get())
        );

        let mut outcomes = Vec::with_capacity(symbols.len());
        while let Some((idx, symbol, fetched)) = fetches.next().await {
            let result = match fetched {
                Ok(series) => self.process(conn, &symbol, &series),
                Err(failure) => Err(failure),
            };
            if let Err(failure) = &result {
                error!(
                    symbol,
                    stage = %failure.stage,
                    error = %failure.message,
                    "Symbol failed"
                );
            }
            outcomes.push((idx, SymbolOutcome { symbol, result }));
        }
        outcomes.sort_by_key(|(idx, _)| *idx);

        let summary = RunSummary {
            outcomes: outcomes.into_iter().map(|(_, o)| o).collect(),
        };
        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "Run finished"
        );
        summary
    }

    fn process(
        &self,
        conn: &mut SqliteConnection,
        symbol: &str,
        series: &DailySeries,
    ) -> Result<SymbolSuccess, SymbolFailure> {
        let handle = self
            .repo
            .get_series(conn, symbol)
            .map_err(|e| store_failure(Stage::Store, e))?;
        let ingest = self
            .ingestor
            .ingest(conn, &handle, &series.bars)
            .map_err(|e| store_failure(Stage::Ingest, e))?;
        let indicators = self
            .engine
            .compute(conn, &handle)
            .map_err(|e| store_failure(Stage::Indicators, e))?;
        Ok(SymbolSuccess { ingest, indicators })
    }
}

fn fetch_failure(e: ProviderError) -> SymbolFailure {
    SymbolFailure {
        stage: Stage::Fetch,
        kind: Some(e.kind()),
        message: e.to_string(),
    }
}

fn store_failure(stage: Stage, e: anyhow::Error) -> SymbolFailure {
    SymbolFailure {
        stage,
        message: format!("{e:#}"),
        kind: None,
    }
}
