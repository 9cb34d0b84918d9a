//! Moving-average indicators derived from stored closes.
//!
//! Two families are supported, simple ([`IndicatorFamily::Sma`]) and exponential
//! ([`IndicatorFamily::Ema`]). Each configured period produces one field per bar,
//! labelled `"<period>_day_sma"` or `"<period>_day_ema"`.

pub mod engine;
pub mod math;

use std::fmt;

pub use engine::{FamilyOutcome, IndicatorEngine, IndicatorReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorFamily {
    Sma,
    Ema,
}

impl IndicatorFamily {
    /// Field label stored on each bar for `period`.
    pub fn label(self, period: usize) -> String {
        format!("{period}_day_{self}")
    }

    /// Computes this family's values for `closes`, index-aligned.
    pub fn series(self, closes: &[f64], period: usize) -> Vec<Option<f64>> {
        match self {
            IndicatorFamily::Sma => math::sma_series(closes, period),
            IndicatorFamily::Ema => math::ema_series(closes, period),
        }
    }
}

impl fmt::Display for IndicatorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndicatorFamily::Sma => "sma",
            IndicatorFamily::Ema => "ema",
        })
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("indicator periods must be positive, got 0")]
pub struct ZeroPeriodError;

/// Ordered, de-duplicated set of positive periods for one family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodSet(Vec<usize>);

impl PeriodSet {
    /// Keeps the first occurrence of each period, in input order.
    pub fn new<I: IntoIterator<Item = usize>>(periods: I) -> Result<Self, ZeroPeriodError> {
        let mut out: Vec<usize> = Vec::new();
        for p in periods {
            if p == 0 {
                return Err(ZeroPeriodError);
            }
            if !out.contains(&p) {
                out.push(p);
            }
        }
        Ok(Self(out))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest period; the family needs at least this many bars.
    pub fn max(&self) -> Option<usize> {
        self.0.iter().copied().max()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

/// Which periods each family computes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorConfig {
    pub sma_periods: PeriodSet,
    pub ema_periods: PeriodSet,
}

impl IndicatorConfig {
    pub fn periods(&self, family: IndicatorFamily) -> &PeriodSet {
        match family {
            IndicatorFamily::Sma => &self.sma_periods,
            IndicatorFamily::Ema => &self.ema_periods,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(IndicatorFamily::Sma.label(20), "20_day_sma");
        assert_eq!(IndicatorFamily::Ema.label(12), "12_day_ema");
    }

    #[test]
    fn period_set_dedups_in_order() {
        let set = PeriodSet::new([50, 20, 50, 200, 20]).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![50, 20, 200]);
        assert_eq!(set.max(), Some(200));
    }

    #[test]
    fn zero_period_rejected() {
        assert_eq!(PeriodSet::new([5, 0]), Err(ZeroPeriodError));
        let empty = PeriodSet::new(Vec::new()).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.max(), None);
    }
}
