//! Caller-supplied context for an evaluation: investor flow, relative strength,
//! and the benchmark market regime.

use serde::{Deserialize, Serialize};

use super::PriceSeries;
use crate::indicators::{rolling_mean, Indicator, Sma};

/// Net buying by foreign and institutional investors over the recent week.
///
/// Money fields are in the quote currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestorFlow {
    pub foreign_consecutive_buy_days: u32,
    pub foreign_net_buy_5d: f64,
    pub inst_net_buy_5d: f64,
}

impl InvestorFlow {
    /// The zero-filled sentinel used when every flow source failed.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Percentile rank (0–100) of the symbol's 3- and 6-month performance
/// versus the evaluated universe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeStrength {
    pub rs_3m: u8,
    pub rs_6m: u8,
}

impl RelativeStrength {
    /// Build from raw percentiles, clamping each into `[0, 100]`.
    pub fn new(rs_3m: i64, rs_6m: i64) -> Self {
        Self {
            rs_3m: rs_3m.clamp(0, 100) as u8,
            rs_6m: rs_6m.clamp(0, 100) as u8,
        }
    }
}

/// Broad-market tape condition, derived from a benchmark index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    #[default]
    Normal,
    /// Benchmark closed below its 20-day average.
    Weak,
}

impl MarketRegime {
    pub const BENCHMARK_MA: usize = 20;

    /// Classify from a benchmark series. Too little history means `Normal`.
    pub fn from_benchmark(benchmark: &PriceSeries) -> Self {
        let ma = Sma::new(Self::BENCHMARK_MA).compute(benchmark.bars());
        match (benchmark.last(), ma.last().copied()) {
            (Some(bar), Some(avg)) if avg.is_finite() && bar.close < avg => MarketRegime::Weak,
            _ => MarketRegime::Normal,
        }
    }

    /// Classify from a raw close series (e.g. an index level feed).
    pub fn from_closes(closes: &[f64]) -> Self {
        let ma = rolling_mean(closes, Self::BENCHMARK_MA);
        match (closes.last(), ma.last()) {
            (Some(&close), Some(&avg)) if avg.is_finite() && close < avg => MarketRegime::Weak,
            _ => MarketRegime::Normal,
        }
    }

    pub fn is_weak(self) -> bool {
        self == MarketRegime::Weak
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn relative_strength_clamps() {
        let rs = RelativeStrength::new(-5, 250);
        assert_eq!(rs.rs_3m, 0);
        assert_eq!(rs.rs_6m, 100);
    }

    #[test]
    fn regime_weak_when_below_average() {
        let mut closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        closes.push(90.0);
        let series = PriceSeries::new("KOSPI", make_bars(&closes)).unwrap();
        assert_eq!(MarketRegime::from_benchmark(&series), MarketRegime::Weak);
        assert_eq!(MarketRegime::from_closes(&closes), MarketRegime::Weak);
    }

    #[test]
    fn regime_normal_when_rising() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let series = PriceSeries::new("KOSPI", make_bars(&closes)).unwrap();
        assert_eq!(MarketRegime::from_benchmark(&series), MarketRegime::Normal);
    }

    #[test]
    fn regime_normal_with_short_history() {
        assert_eq!(MarketRegime::from_closes(&[100.0, 90.0]), MarketRegime::Normal);
    }

    #[test]
    fn zero_flow_is_default() {
        assert_eq!(InvestorFlow::zero(), InvestorFlow::default());
    }
}
