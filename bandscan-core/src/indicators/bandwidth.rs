//! Bandwidth and its trailing percentile rank.
//!
//! Bandwidth = (upper - lower) / middle, a volatility-compression measure.
//! The percentile rank places the latest bandwidth within its trailing window:
//! `100 * (count(window <= last) - 1) / (window_len - 1)`.

use super::BollingerBands;

/// Bandwidth series. A zero or NaN middle band yields NaN, never infinity.
pub fn bandwidth(bands: &BollingerBands) -> Vec<f64> {
    bands
        .middle
        .iter()
        .zip(bands.upper.iter().zip(&bands.lower))
        .map(|(&mid, (&upper, &lower))| {
            if mid.is_nan() || mid == 0.0 {
                f64::NAN
            } else {
                let bw = (upper - lower) / mid;
                if bw.is_finite() {
                    bw
                } else {
                    f64::NAN
                }
            }
        })
        .collect()
}

/// Trailing percentile rank of each value within its last `lookback` values.
///
/// Defined only when the full window is available and NaN-free. A lookback
/// below 2 leaves every value indeterminate.
pub fn percentile_rank(values: &[f64], lookback: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if lookback < 2 || n < lookback {
        return result;
    }

    for i in (lookback - 1)..n {
        let window = &values[(i + 1 - lookback)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        let last = values[i];
        let at_or_below = window.iter().filter(|&&v| v <= last).count();
        result[i] = 100.0 * (at_or_below - 1) as f64 / (lookback - 1) as f64;
    }

    result
}
