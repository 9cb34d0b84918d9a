use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use bar_provider::models::bar::{DailySeries, RawBar};
use bar_provider::providers::{
    DataProvider, FailureKind, MissingTimeSeriesSnafu, ProviderError, StatusSnafu,
};
use price_history::config::{AppConfig, load_config_str};
use price_history::indicators::FamilyOutcome;
use price_history::pipeline::{Pipeline, Stage};
use price_history::store::{SeriesRepo, repo::SqliteSeriesRepo, universe};

mod common;
use common::{bars_from_closes, setup_db};

/// Serves canned series; symbols without one get a schema error.
/// `flaky` symbols answer 503 for their first `n` calls.
#[derive(Default)]
struct StubProvider {
    series: HashMap<String, Vec<RawBar>>,
    flaky: HashMap<String, u32>,
    calls: HashMap<String, AtomicU32>,
}

impl StubProvider {
    fn with(mut self, symbol: &str, closes: &[f64]) -> Self {
        self.series.insert(symbol.into(), bars_from_closes(closes));
        self.calls.insert(symbol.into(), AtomicU32::new(0));
        self
    }

    fn flaky(mut self, symbol: &str, failures: u32) -> Self {
        self.flaky.insert(symbol.into(), failures);
        self
    }
}

#[async_trait]
impl DataProvider for StubProvider {
    async fn fetch_daily(&self, symbol: &str) -> Result<DailySeries, ProviderError> {
        let Some(bars) = self.series.get(symbol) else {
            return MissingTimeSeriesSnafu {
                symbol,
                message: "Invalid API call",
            }
            .fail();
        };
        let n = self.calls[symbol].fetch_add(1, Ordering::SeqCst);
        if n < self.flaky.get(symbol).copied().unwrap_or(0) {
            return StatusSnafu {
                status: 503u16,
                body: "try later",
            }
            .fail();
        }
        // vendors list newest first
        let mut bars = bars.clone();
        bars.reverse();
        Ok(DailySeries::new(symbol, bars))
    }
}

fn test_config(max_retries: u32) -> AppConfig {
    load_config_str(&format!(
        r#"
        [indicators]
        sma_periods = [3]
        ema_periods = [3]

        [run]
        concurrency = 2
        max_retries = {max_retries}
        base_delay_ms = 0
        "#
    ))
    .unwrap()
}

fn symbols(s: &[&str]) -> Vec<String> {
    s.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn one_failing_symbol_does_not_affect_the_others() {
    let (_db, mut conn) = setup_db();
    let repo = SqliteSeriesRepo::new();
    let provider = StubProvider::default()
        .with("AAA", &[10.0, 20.0, 30.0, 40.0, 50.0])
        .with("CCC", &[1.0, 2.0, 3.0]);
    let pipeline = Pipeline::new(&test_config(0), Arc::new(provider), repo);

    let summary = pipeline
        .run(&mut conn, &symbols(&["AAA", "BBB", "CCC"]))
        .await;

    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.failed(), 1);
    let order: Vec<_> = summary.outcomes.iter().map(|o| o.symbol.as_str()).collect();
    assert_eq!(order, vec!["AAA", "BBB", "CCC"]);

    let failure = summary.get("BBB").unwrap().result.as_ref().unwrap_err();
    assert_eq!(failure.stage, Stage::Fetch);
    assert_eq!(failure.kind, Some(FailureKind::Schema));
    assert!(repo.find_series(&mut conn, "BBB").unwrap().is_none());

    let aaa = repo.find_series(&mut conn, "AAA").unwrap().unwrap();
    let bars = repo.list_ascending_by_date(&mut conn, &aaa).unwrap();
    assert_eq!(bars.len(), 5);
    assert_eq!(bars[4].indicators["3_day_sma"], 40.0);
    assert_eq!(bars[4].indicators["3_day_ema"], 40.0);

    let ccc = summary.get("CCC").unwrap().result.as_ref().unwrap();
    assert_eq!(ccc.ingest.inserted, 3);
    assert_eq!(ccc.indicators.sma, FamilyOutcome::Computed { values_written: 1 });

    assert!(
        summary
            .to_string()
            .ends_with("SUMMARY: 2 succeeded, 1 failed")
    );
}

#[tokio::test]
async fn failed_fetch_leaves_stored_history_untouched() {
    let (_db, mut conn) = setup_db();
    let repo = SqliteSeriesRepo::new();
    let seed = StubProvider::default().with("BBB", &[10.0, 20.0, 30.0, 40.0, 50.0]);
    Pipeline::new(&test_config(0), Arc::new(seed), repo)
        .run(&mut conn, &symbols(&["BBB"]))
        .await;

    let bbb = repo.find_series(&mut conn, "BBB").unwrap().unwrap();
    let before = repo.list_ascending_by_date(&mut conn, &bbb).unwrap();
    assert_eq!(before.len(), 5);
    assert_eq!(before[4].indicators["3_day_sma"], 40.0);

    // the vendor is down for BBB and would send different prices if it answered
    let outage = StubProvider::default()
        .with("AAA", &[1.0, 2.0, 3.0])
        .with("BBB", &[99.0, 99.0, 99.0, 99.0, 99.0, 99.0])
        .flaky("BBB", u32::MAX);
    let summary = Pipeline::new(&test_config(1), Arc::new(outage), repo)
        .run(&mut conn, &symbols(&["AAA", "BBB"]))
        .await;

    assert!(summary.get("AAA").unwrap().result.is_ok());
    let failure = summary.get("BBB").unwrap().result.as_ref().unwrap_err();
    assert_eq!(failure.stage, Stage::Fetch);
    assert_eq!(failure.kind, Some(FailureKind::Transport));
    assert_eq!(repo.list_ascending_by_date(&mut conn, &bbb).unwrap(), before);
}

#[tokio::test]
async fn rerun_is_idempotent() {
    let (_db, mut conn) = setup_db();
    let repo = SqliteSeriesRepo::new();
    let provider = Arc::new(StubProvider::default().with("AAA", &[10.0, 20.0, 30.0, 40.0]));
    let pipeline = Pipeline::new(&test_config(0), provider, repo);

    pipeline.run(&mut conn, &symbols(&["AAA"])).await;
    let aaa = repo.find_series(&mut conn, "AAA").unwrap().unwrap();
    let before = repo.list_ascending_by_date(&mut conn, &aaa).unwrap();

    let summary = pipeline.run(&mut conn, &symbols(&["AAA"])).await;
    let second = summary.get("AAA").unwrap().result.as_ref().unwrap();
    assert_eq!(second.ingest.inserted, 0);
    assert_eq!(second.ingest.skipped_existing, 4);
    assert_eq!(repo.list_ascending_by_date(&mut conn, &aaa).unwrap(), before);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let (_db, mut conn) = setup_db();
    let repo = SqliteSeriesRepo::new();
    let provider = StubProvider::default()
        .with("AAA", &[1.0, 2.0, 3.0])
        .flaky("AAA", 2)
        .with("BBB", &[1.0, 2.0, 3.0])
        .flaky("BBB", 5);
    let pipeline = Pipeline::new(&test_config(2), Arc::new(provider), repo);

    let summary = pipeline.run(&mut conn, &symbols(&["AAA", "BBB"])).await;

    assert!(summary.get("AAA").unwrap().result.is_ok());
    let bbb = summary.get("BBB").unwrap().result.as_ref().unwrap_err();
    assert_eq!(bbb.stage, Stage::Fetch);
    assert_eq!(bbb.kind, Some(FailureKind::Transport));
}

#[tokio::test]
async fn universe_run_uses_tracked_tickers() {
    let (_db, mut conn) = setup_db();
    let repo = SqliteSeriesRepo::new();
    universe::add_ticker(&mut conn, "ccc").unwrap();
    universe::add_ticker(&mut conn, "AAA").unwrap();
    let provider = StubProvider::default()
        .with("AAA", &[1.0])
        .with("CCC", &[2.0])
        .with("ZZZ", &[3.0]);
    let pipeline = Pipeline::new(&test_config(0), Arc::new(provider), repo);

    let summary = pipeline.run_universe(&mut conn).await.unwrap();
    let order: Vec<_> = summary.outcomes.iter().map(|o| o.symbol.as_str()).collect();
    assert_eq!(order, vec!["AAA", "CCC"]);
    assert!(repo.find_series(&mut conn, "ZZZ").unwrap().is_none());

    // one bar is not enough for a 3-day window
    let aaa = summary.get("AAA").unwrap().result.as_ref().unwrap();
    assert_eq!(
        aaa.indicators.sma,
        FamilyOutcome::InsufficientHistory { have: 1, need: 3 }
    );
}
