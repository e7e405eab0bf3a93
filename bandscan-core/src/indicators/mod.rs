//! Indicator engine.
//!
//! Indicators are pure functions: bar history in, numeric series out, one value
//! per bar. Warm-up bars (and any window touching a NaN input) are `f64::NAN`;
//! NaN means "indeterminate" and is never coerced to zero here. Resolution to a
//! concrete value happens once, at the final bar, in `signals::FinalBar`.
//!
//! No value at bar t may depend on data from bar t+1 or later.

pub mod adx;
pub mod atr;
pub mod bandwidth;
pub mod bollinger;
pub mod sma;

pub use adx::Adx;
pub use atr::{true_range, wilder_smooth, Atr};
pub use bandwidth::{bandwidth, percentile_rank};
pub use bollinger::{Bollinger, BollingerBand, BollingerBands};
pub use sma::{PriceField, Sma};

use crate::domain::Bar;

/// A single-series indicator over daily bars.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "adx_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are always NaN.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Rolling simple mean over `period` values.
///
/// A window containing NaN yields NaN. The first `period - 1` values are NaN.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = window.iter().sum::<f64>() / period as f64;
    }

    result
}

/// Rolling population standard deviation (divide by N). NaN windows yield NaN.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }
    let means = rolling_mean(values, period);
    for i in (period - 1)..n {
        let mean = means[i];
        if mean.is_nan() {
            continue;
        }
        let variance = values[(i + 1 - period)..=i]
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / period as f64;
        result[i] = variance.sqrt();
    }
    result
}

/// Read a numeric series at `index`, mapping NaN and out-of-range to `None`.
pub fn value_at(series: &[f64], index: usize) -> Option<f64> {
    series.get(index).copied().filter(|v| v.is_finite())
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high = max(open,close) + 1,
/// low = min(open,close) - 1, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Build bars from (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
