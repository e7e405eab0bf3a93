//! Composite scorer: five capped sub-scores summed into a 0–100 total.
//!
//! Each sub-score is clamped to its own weight. Weights are validated to sum
//! to at most 100, so the total needs no clamp of its own.

pub mod pattern;
pub mod supply;
pub mod trend;
pub mod volume;

pub use pattern::pattern_score;
pub use supply::supply_score;
pub use trend::{adx_points, trend_score};
pub use volume::volume_score;

use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::domain::{InvestorFlow, MarketRegime, RelativeStrength};
use crate::risk;
use crate::signals::FinalBar;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub trend: u32,
    pub pattern: u32,
    pub volume: u32,
    pub supply: u32,
    pub risk: u32,
}

impl SubScores {
    pub fn total(&self) -> u32 {
        self.trend + self.pattern + self.volume + self.supply + self.risk
    }
}

/// Score the resolved final bar. `risk_pct` comes from [`risk::assess`].
pub fn score(
    fb: &FinalBar,
    config: &ScanConfig,
    flow: Option<&InvestorFlow>,
    rs: RelativeStrength,
    risk_pct: f64,
    regime: MarketRegime,
) -> SubScores {
    let weights = &config.scoring;
    SubScores {
        trend: trend_score(fb, weights),
        pattern: pattern_score(fb, rs, weights),
        volume: volume_score(fb, &config.volume_dryup, weights),
        supply: supply_score(flow, weights),
        risk: risk::risk_score(risk_pct, weights.risk_weight, regime),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::signals::FinalBar;

    /// A neutral final bar: close 10,000, every average equal to close,
    /// no flags set, unit volume ratio.
    pub fn neutral() -> FinalBar {
        FinalBar {
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            open: 10_000.0,
            high: 10_100.0,
            low: 9_900.0,
            close: 10_000.0,
            volume: 1_000_000.0,
            prev: None,
            ma_fast: 10_000.0,
            ma_mid: 10_000.0,
            ma_slow: 10_000.0,
            ma10: 10_000.0,
            ma60: 10_000.0,
            bb_upper: 10_500.0,
            adx: 0.0,
            bandwidth_rank: None,
            vol_avg: Some(1_000_000.0),
            volume_ratio: 1.0,
            atr20: Some(200.0),
            door_knock: false,
            squeeze: false,
            memory_near: false,
            past_explosion: false,
            breakout: false,
            rebreakout: false,
            volume_confirm: false,
            trigger_a: false,
            trigger_b: false,
            trigger_c: false,
            dryup_count: 0,
            climax_high: None,
            climax_low: None,
            prior_climax_low: None,
        }
    }
}
