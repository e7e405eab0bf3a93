//! Simple Moving Average (SMA) of close or volume.
//!
//! Lookback: period - 1 (first valid value at index period-1).

use super::{rolling_mean, Indicator};
use crate::domain::Bar;

/// Which bar field an average is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Close,
    Volume,
}

impl PriceField {
    fn extract(self, bar: &Bar) -> f64 {
        match self {
            PriceField::Close => bar.close,
            PriceField::Volume => bar.volume as f64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    field: PriceField,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self::of(PriceField::Close, period)
    }

    /// Average of volume, used for every volume ratio in the pattern detector.
    pub fn volume(period: usize) -> Self {
        Self::of(PriceField::Volume, period)
    }

    pub fn of(field: PriceField, period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        let name = match field {
            PriceField::Close => format!("sma_{period}"),
            PriceField::Volume => format!("vol_sma_{period}"),
        };
        Self {
            period,
            field,
            name,
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let values: Vec<f64> = bars.iter().map(|b| self.field.extract(b)).collect();
        rolling_mean(&values, self.period)
    }
}
