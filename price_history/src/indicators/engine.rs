use diesel::SqliteConnection;
use tracing::{debug, info};

use crate::{
    indicators::{IndicatorConfig, IndicatorFamily},
    store::{SeriesHandle, SeriesRepo, StoredBar},
};

/// What happened to one indicator family during [`IndicatorEngine::compute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyOutcome {
    Computed { values_written: usize },
    /// Fewer bars than the family's largest period; nothing was written.
    InsufficientHistory { have: usize, need: usize },
    /// No periods configured for the family.
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorReport {
    pub sma: FamilyOutcome,
    pub ema: FamilyOutcome,
}

/// Recomputes moving averages over a symbol's full stored history.
///
/// Every run is a full backfill; writes are upserts, so recomputing over an
/// unchanged series stores exactly the same values again.
pub struct IndicatorEngine<R> {
    repo: R,
    config: IndicatorConfig,
}

impl<R: SeriesRepo> IndicatorEngine<R> {
    pub fn new(repo: R, config: IndicatorConfig) -> Self {
        Self { repo, config }
    }

    pub fn compute(
        &self,
        conn: &mut SqliteConnection,
        series: &SeriesHandle,
    ) -> anyhow::Result<IndicatorReport> {
        let bars = self.repo.list_ascending_by_date(conn, series)?;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let sma = self.compute_family(conn, series, &bars, &closes, IndicatorFamily::Sma)?;
        let ema = self.compute_family(conn, series, &bars, &closes, IndicatorFamily::Ema)?;
        Ok(IndicatorReport { sma, ema })
    }

    fn compute_family(
        &self,
        conn: &mut SqliteConnection,
        series: &SeriesHandle,
        bars: &[StoredBar],
        closes: &[f64],
        family: IndicatorFamily,
    ) -> anyhow::Result<FamilyOutcome> {
        let periods = self.config.periods(family);
        let Some(need) = periods.max() else {
            debug!(symbol = series.symbol(), %family, "No periods configured");
            return Ok(FamilyOutcome::Disabled);
        };
        if bars.len() < need {
            info!(
                symbol = series.symbol(),
                %family,
                have = bars.len(),
                need,
                "Insufficient history, skipping"
            );
            return Ok(FamilyOutcome::InsufficientHistory {
                have: bars.len(),
                need,
            });
        }

        let written = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
            let mut written = 0;
            for period in periods.iter() {
                let label = family.label(period);
                for (bar, value) in bars.iter().zip(family.series(closes, period)) {
                    if let Some(value) = value {
                        self.repo.update_field(conn, series, bar.date, &label, value)?;
                        written += 1;
                    }
                }
            }
            Ok(written)
        })?;

        info!(symbol = series.symbol(), %family, values = written, "Indicators updated");
        Ok(FamilyOutcome::Computed {
            values_written: written,
        })
    }
}
