use std::fmt;

use bar_provider::providers::FailureKind;

use crate::{
    indicators::{FamilyOutcome, IndicatorReport},
    ingest::IngestReport,
};

/// Where in the per-symbol sequence a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    /// Resolving the symbol's collection.
    Store,
    Ingest,
    Indicators,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Fetch => "fetch",
            Stage::Store => "store",
            Stage::Ingest => "ingest",
            Stage::Indicators => "indicators",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolFailure {
    pub stage: Stage,
    pub message: String,
    /// Set for provider failures.
    pub kind: Option<FailureKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolSuccess {
    pub ingest: IngestReport,
    pub indicators: IndicatorReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub result: Result<SymbolSuccess, SymbolFailure>,
}

/// Per-symbol results of one run, in the order the symbols were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub outcomes: Vec<SymbolOutcome>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolOutcome> {
        self.outcomes.iter().find(|o| o.symbol == symbol)
    }
}

fn family(f: &mut fmt::Formatter<'_>, name: &str, outcome: FamilyOutcome) -> fmt::Result {
    match outcome {
        FamilyOutcome::Computed { values_written } => write!(f, "{name} {values_written}"),
        FamilyOutcome::InsufficientHistory { have, need } => {
            write!(f, "{name} skipped ({have}/{need} bars)")
        }
        FamilyOutcome::Disabled => write!(f, "{name} off"),
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for o in &self.outcomes {
            match &o.result {
                Ok(s) => {
                    write!(
                        f,
                        "  {:<8} ok      +{} new, {} existing; ",
                        o.symbol, s.ingest.inserted, s.ingest.skipped_existing
                    )?;
                    family(f, "sma", s.indicators.sma)?;
                    f.write_str(", ")?;
                    family(f, "ema", s.indicators.ema)?;
                    writeln!(f)?;
                }
                Err(e) => writeln!(f, "  {:<8} FAILED  [{}] {}", o.symbol, e.stage, e.message)?,
            }
        }
        write!(
            f,
            "SUMMARY: {} succeeded, {} failed",
            self.succeeded(),
            self.failed()
        )
    }
}
