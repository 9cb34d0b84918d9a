//! Moving-average arithmetic over a slice of closes.
//!
//! Both functions return a vector index-aligned with the input; positions before the
//! first full window are `None`. A period of zero yields all `None`.

/// Simple moving average: the mean of the `period` closes ending at each index.
pub fn sma_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return out;
    }
    let divisor = period as f64;
    for (end, slot) in out.iter_mut().enumerate().skip(period - 1) {
        let window = &closes[end + 1 - period..=end];
        *slot = Some(window.iter().fold(0.0, |acc, c| acc + c) / divisor);
    }
    out
}

/// Exponential moving average with smoothing `2 / (period + 1)`.
///
/// The first value, at index `period - 1`, is the SMA of the first `period` closes.
pub fn ema_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return out;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut prev = closes[..period].iter().fold(0.0, |acc, c| acc + c) / period as f64;
    out[period - 1] = Some(prev);
    for (close, slot) in closes.iter().zip(out.iter_mut()).skip(period) {
        prev = (close - prev) * k + prev;
        *slot = Some(prev);
    }
    out
}
