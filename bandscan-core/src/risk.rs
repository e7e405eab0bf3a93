//! Protective stop and risk sub-score.
//!
//! The stop is the prior climax low when Trigger B fired, otherwise the lowest
//! low of the trailing `stop_lookback` bars. A stop that implies no risk, or
//! more than `max_risk_pct`, is replaced by the default-risk stop.

use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::domain::{Bar, MarketRegime};
use crate::signals::FinalBar;

/// Deduction tiers: (risk strictly above, points deducted), checked in order.
const DEDUCTION_TIERS: [(f64, u32); 3] = [(0.10, 5), (0.08, 3), (0.05, 1)];

/// Where the stop came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBasis {
    ClimaxLow,
    TrailingLow,
    /// Raw stop was unusable; `close * (1 - default_risk_pct)` was substituted.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub stop: f64,
    /// Fraction of close, e.g. 0.08 for 8%.
    pub risk_pct: f64,
    pub basis: StopBasis,
}

/// Derive the stop and risk fraction for the bar at `fb`.
///
/// `bars` must end at the bar `fb` was resolved from.
pub fn assess(bars: &[Bar], fb: &FinalBar, config: &RiskConfig) -> RiskAssessment {
    let close = fb.close;
    let default_stop = close * (1.0 - config.default_risk_pct);

    let (raw_stop, basis) = match (fb.trigger_b, fb.prior_climax_low) {
        (true, Some(low)) => (low, StopBasis::ClimaxLow),
        _ => {
            let start = bars.len().saturating_sub(config.stop_lookback);
            let lowest = bars[start..]
                .iter()
                .map(|b| b.low)
                .filter(|l| !l.is_nan())
                .fold(f64::INFINITY, f64::min);
            (lowest, StopBasis::TrailingLow)
        }
    };

    let (stop, basis) = if raw_stop.is_finite() && raw_stop > 0.0 {
        (raw_stop, basis)
    } else {
        (default_stop, StopBasis::Default)
    };

    let risk_pct = (close - stop) / close;
    if risk_pct > 0.0 && risk_pct <= config.max_risk_pct {
        RiskAssessment {
            stop,
            risk_pct,
            basis,
        }
    } else {
        RiskAssessment {
            stop: default_stop,
            risk_pct: config.default_risk_pct,
            basis: StopBasis::Default,
        }
    }
}

/// Points deducted from the risk cap for a given risk fraction.
pub fn deduction(risk_pct: f64, regime: MarketRegime) -> u32 {
    let base = DEDUCTION_TIERS
        .iter()
        .find(|(above, _)| risk_pct > *above)
        .map(|(_, points)| *points)
        .unwrap_or(0);
    if regime.is_weak() {
        base * 2
    } else {
        base
    }
}

/// Risk sub-score: `risk_weight` minus the deduction, floored at zero.
pub fn risk_score(risk_pct: f64, risk_weight: u32, regime: MarketRegime) -> u32 {
    risk_weight.saturating_sub(deduction(risk_pct, regime))
}
