//! Persisting a fetched batch of raw bars into a symbol's collection.
//!
//! Ingestion is append-only and idempotent: a bar whose date is already stored is
//! skipped, never overwritten, so re-running the same batch changes nothing.

use std::collections::HashSet;

use bar_provider::models::bar::RawBar;
use diesel::SqliteConnection;
use tracing::{debug, info};

use crate::store::{InsertOutcome, SeriesHandle, SeriesRepo};

/// Counts describing what one [`Ingestor::ingest`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Bars handed to the ingestor.
    pub received: usize,
    /// New records created.
    pub inserted: usize,
    /// Bars whose date was already stored.
    pub skipped_existing: usize,
    /// Later repeats of a date that appeared earlier in the same batch.
    pub duplicates_in_batch: usize,
}

pub struct Ingestor<R> {
    repo: R,
}

impl<R: SeriesRepo> Ingestor<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Inserts every bar of `bars` whose date is not yet present in `series`.
    ///
    /// The whole batch is one immediate transaction: either every new bar is
    /// visible when this returns, or none is.
    pub fn ingest(
        &self,
        conn: &mut SqliteConnection,
        series: &SeriesHandle,
        bars: &[RawBar],
    ) -> anyhow::Result<IngestReport> {
        let report = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
            let mut report = IngestReport {
                received: bars.len(),
                ..Default::default()
            };
            let mut seen = HashSet::with_capacity(bars.len());

            for bar in bars {
                if !seen.insert(bar.date) {
                    report.duplicates_in_batch += 1;
                    continue;
                }
                // Dates already stored come back as AlreadyPresent.
                match self.repo.insert(conn, series, bar)? {
                    InsertOutcome::Inserted => report.inserted += 1,
                    InsertOutcome::AlreadyPresent => report.skipped_existing += 1,
                }
            }
            Ok(report)
        })?;

        if report.duplicates_in_batch > 0 {
            debug!(
                symbol = series.symbol(),
                duplicates = report.duplicates_in_batch,
                "Batch repeated some dates; kept the first occurrence"
            );
        }
        info!(
            symbol = series.symbol(),
            received = report.received,
            inserted = report.inserted,
            skipped = report.skipped_existing,
            "Ingested daily bars"
        );
        Ok(report)
    }
}
