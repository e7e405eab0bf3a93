//! ADX: Average Directional Index.
//!
//! Steps:
//! 1. Compute +DM and -DM from consecutive bars (0 on the first bar)
//! 2. Smooth +DM, -DM, and TR over `period` bars
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR)
//! 4. -DI = 100 * smoothed(-DM) / smoothed(TR)
//! 5. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 6. ADX = smoothed DX
//!
//! Smoothing is a simple rolling mean by default; Wilder smoothing is
//! available through [`AdxSmoothing::Wilder`]. A zero smoothed TR or a zero
//! DI sum leaves that bar indeterminate rather than zero.

use super::atr::{true_range, wilder_smooth};
use super::{rolling_mean, Indicator};
use crate::config::AdxSmoothing;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    smoothing: AdxSmoothing,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self::with_smoothing(period, AdxSmoothing::RollingMean)
    }

    pub fn with_smoothing(period: usize, smoothing: AdxSmoothing) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        let name = match smoothing {
            AdxSmoothing::RollingMean => format!("adx_{period}"),
            AdxSmoothing::Wilder => format!("adx_wilder_{period}"),
        };
        Self {
            period,
            smoothing,
            name,
        }
    }

    fn smooth(&self, values: &[f64]) -> Vec<f64> {
        match self.smoothing {
            AdxSmoothing::RollingMean => rolling_mean(values, self.period),
            AdxSmoothing::Wilder => wilder_smooth(values, self.period),
        }
    }
}

/// +DM and -DM series. Index 0 has no predecessor and carries 0.
fn directional_movement(bars: &[Bar]) -> (Vec<f64>, Vec<f64>) {
    let n = bars.len();
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];

    for i in 1..n {
        let (cur, prev) = (&bars[i], &bars[i - 1]);
        if cur.high.is_nan() || cur.low.is_nan() || prev.high.is_nan() || prev.low.is_nan() {
            plus_dm[i] = f64::NAN;
            minus_dm[i] = f64::NAN;
            continue;
        }

        let up = cur.high - prev.high;
        let down = prev.low - cur.low;

        if up > down && up > 0.0 {
            plus_dm[i] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i] = down;
        }
    }

    (plus_dm, minus_dm)
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.smoothing {
            // DI needs `period` bars starting at bar 0, ADX another `period - 1`.
            AdxSmoothing::RollingMean => 2 * self.period - 2,
            // Wilder seeds from bar 1, where a true previous close exists.
            AdxSmoothing::Wilder => 2 * self.period - 1,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        if n == 0 {
            return Vec::new();
        }

        let mut tr = true_range(bars);
        let (mut plus_dm, mut minus_dm) = directional_movement(bars);
        if self.smoothing == AdxSmoothing::Wilder {
            tr[0] = f64::NAN;
            plus_dm[0] = f64::NAN;
            minus_dm[0] = f64::NAN;
        }

        let smooth_tr = self.smooth(&tr);
        let smooth_plus = self.smooth(&plus_dm);
        let smooth_minus = self.smooth(&minus_dm);

        let mut dx = vec![f64::NAN; n];
        for i in 0..n {
            let atr = smooth_tr[i];
            if atr.is_nan() || atr == 0.0 || smooth_plus[i].is_nan() || smooth_minus[i].is_nan() {
                continue;
            }
            let plus_di = 100.0 * smooth_plus[i] / atr;
            let minus_di = 100.0 * smooth_minus[i] / atr;
            let di_sum = plus_di + minus_di;
            if di_sum == 0.0 {
                continue;
            }
            dx[i] = 100.0 * (plus_di - minus_di).abs() / di_sum;
        }

        self.smooth(&dx)
    }
}
