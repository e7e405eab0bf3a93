//! Per-symbol evaluation: bars in, one bounded score record out.
//!
//! The pipeline runs strictly forward: indicators → signals → final-bar
//! resolution → setup → risk → score. Nothing here holds state across calls.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ScanConfig;
use crate::domain::{InvestorFlow, MarketRegime, PriceSeries, RelativeStrength};
use crate::risk::{self, RiskAssessment};
use crate::scoring::{self, SubScores};
use crate::setup::{classify, SetupInputs, SetupTag};
use crate::signals::{FinalBar, SignalSet};
use crate::strategy::{self, StrategyCandidate};

/// Window for the average-traded-value liquidity floor.
pub const ADV_WINDOW: usize = 20;

/// Why a symbol produced no score. Never an error for the scan as a whole.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("insufficient history: {have} bars, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("zero liquidity: volume average is zero")]
    ZeroLiquidity,

    #[error("close {close} below price floor {floor}")]
    BelowPriceFloor { close: f64, floor: f64 },

    #[error("average traded value {adv:.0} below floor {floor:.0}")]
    BelowLiquidityFloor { adv: f64, floor: f64 },

    #[error("final bar on {date} is not a valid OHLC bar")]
    InvalidFinalBar { date: NaiveDate },

    #[error("{message}")]
    InvalidConfig { message: String },
}

impl SkipReason {
    /// Short machine-readable label for summaries and logs.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::InsufficientHistory { .. } => "insufficient_history",
            SkipReason::ZeroLiquidity => "zero_liquidity",
            SkipReason::BelowPriceFloor { .. } => "below_price_floor",
            SkipReason::BelowLiquidityFloor { .. } => "below_liquidity_floor",
            SkipReason::InvalidFinalBar { .. } => "invalid_final_bar",
            SkipReason::InvalidConfig { .. } => "invalid_config",
        }
    }
}

/// One symbol's score on one evaluation date.
///
/// `total_score` always equals the sum of the five sub-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub date: NaiveDate,
    pub close: f64,
    pub stop: f64,
    /// Fraction of close (0.08 = 8%).
    pub risk_pct: f64,
    pub trend_score: u32,
    pub pattern_score: u32,
    pub volume_score: u32,
    pub supply_score: u32,
    pub risk_score: u32,
    pub total_score: u32,
    pub setup_tag: SetupTag,
    pub bb_upper: f64,
    pub ma20: f64,
    pub ma60: f64,
    pub adx: f64,
    pub bandwidth_rank: Option<f64>,
    pub door_knock: bool,
    pub squeeze: bool,
    pub memory_near: bool,
    pub dryup_count: usize,
}

impl ScoreResult {
    pub fn sub_scores(&self) -> SubScores {
        SubScores {
            trend: self.trend_score,
            pattern: self.pattern_score,
            volume: self.volume_score,
            supply: self.supply_score,
            risk: self.risk_score,
        }
    }
}

/// Everything computed for one evaluation, for callers that report more than
/// the score record.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub result: ScoreResult,
    pub final_bar: FinalBar,
    pub risk: RiskAssessment,
    pub strategies: Vec<StrategyCandidate>,
}

/// Evaluate under a normal market regime.
pub fn evaluate(
    series: &PriceSeries,
    config: &ScanConfig,
    flow: Option<&InvestorFlow>,
    rs: RelativeStrength,
) -> Result<ScoreResult, SkipReason> {
    evaluate_in_regime(series, config, flow, rs, MarketRegime::Normal)
}

pub fn evaluate_in_regime(
    series: &PriceSeries,
    config: &ScanConfig,
    flow: Option<&InvestorFlow>,
    rs: RelativeStrength,
    regime: MarketRegime,
) -> Result<ScoreResult, SkipReason> {
    evaluate_detailed(series, config, flow, rs, regime).map(|e| e.result)
}

/// Full evaluation including the resolved final bar and strategy candidates.
pub fn evaluate_detailed(
    series: &PriceSeries,
    config: &ScanConfig,
    flow: Option<&InvestorFlow>,
    rs: RelativeStrength,
    regime: MarketRegime,
) -> Result<Evaluation, SkipReason> {
    // Zero-length windows would divide by zero or underflow in the indicators.
    config.validate().map_err(|e| SkipReason::InvalidConfig {
        message: e.to_string(),
    })?;

    let bars = series.bars();
    let need = config.required_history();
    let last = match bars.last() {
        Some(bar) if bars.len() >= need => *bar,
        _ => {
            return Err(SkipReason::InsufficientHistory {
                have: bars.len(),
                need,
            })
        }
    };
    if !last.is_sane() {
        return Err(SkipReason::InvalidFinalBar { date: last.date });
    }

    let signals = SignalSet::compute(bars, config);
    let fb = FinalBar::last(bars, &signals).ok_or(SkipReason::InsufficientHistory {
        have: bars.len(),
        need,
    })?;

    match fb.vol_avg {
        Some(avg) if avg > 0.0 => {}
        _ => return Err(SkipReason::ZeroLiquidity),
    }
    let universe = &config.universe;
    if fb.close < universe.min_close {
        return Err(SkipReason::BelowPriceFloor {
            close: fb.close,
            floor: universe.min_close,
        });
    }
    let adv = average_traded_value(bars);
    if adv < universe.min_adv20_value {
        return Err(SkipReason::BelowLiquidityFloor {
            adv,
            floor: universe.min_adv20_value,
        });
    }

    let setup_tag = classify(SetupInputs::from(&fb), config.setup.policy);
    let risk = risk::assess(bars, &fb, &config.risk);
    let scores = scoring::score(&fb, config, flow, rs, risk.risk_pct, regime);

    let result = ScoreResult {
        date: fb.date,
        close: fb.close,
        stop: risk.stop,
        risk_pct: risk.risk_pct,
        trend_score: scores.trend,
        pattern_score: scores.pattern,
        volume_score: scores.volume,
        supply_score: scores.supply,
        risk_score: scores.risk,
        total_score: scores.total(),
        setup_tag,
        bb_upper: fb.bb_upper,
        ma20: fb.ma_fast,
        ma60: fb.ma60,
        adx: fb.adx,
        bandwidth_rank: fb.bandwidth_rank,
        door_knock: fb.door_knock,
        squeeze: fb.squeeze,
        memory_near: fb.memory_near,
        dryup_count: fb.dryup_count,
    };

    Ok(Evaluation {
        strategies: strategy::recommend(&fb),
        result,
        final_bar: fb,
        risk,
    })
}

/// Mean close × volume over the trailing [`ADV_WINDOW`] bars.
pub fn average_traded_value(bars: &[crate::domain::Bar]) -> f64 {
    let start = bars.len().saturating_sub(ADV_WINDOW);
    let window = &bars[start..];
    if window.is_empty() {
        return 0.0;
    }
    window.iter().map(|b| b.traded_value()).sum::<f64>() / window.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;

    fn flat_series(n: usize, close: f64, volume: u64) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = (0..n)
            .map(|i| Bar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 100.0,
                low: close - 100.0,
                close,
                volume,
            })
            .collect();
        PriceSeries::new("005930", bars).unwrap()
    }

    #[test]
    fn short_history_is_skipped() {
        let series = flat_series(59, 10_000.0, 1_000_000);
        let err = evaluate(&series, &ScanConfig::default(), None, RelativeStrength::default())
            .unwrap_err();
        assert_eq!(err, SkipReason::InsufficientHistory { have: 59, need: 60 });
        assert_eq!(err.label(), "insufficient_history");
    }

    #[test]
    fn zero_volume_is_skipped() {
        let series = flat_series(80, 10_000.0, 0);
        let err = evaluate(&series, &ScanConfig::default(), None, RelativeStrength::default())
            .unwrap_err();
        assert_eq!(err, SkipReason::ZeroLiquidity);
    }

    #[test]
    fn price_floor() {
        let series = flat_series(80, 900.0, 10_000_000);
        let err = evaluate(&series, &ScanConfig::default(), None, RelativeStrength::default())
            .unwrap_err();
        assert!(matches!(err, SkipReason::BelowPriceFloor { .. }));
    }

    #[test]
    fn liquidity_floor() {
        // 10,000 × 50,000 = 5e8 traded value, under the 1e9 floor
        let series = flat_series(80, 10_000.0, 50_000);
        let err = evaluate(&series, &ScanConfig::default(), None, RelativeStrength::default())
            .unwrap_err();
        assert!(matches!(err, SkipReason::BelowLiquidityFloor { .. }));
    }

    #[test]
    fn invalid_final_bar() {
        let mut bars = flat_series(80, 10_000.0, 1_000_000).bars().to_vec();
        bars[79].low = 20_000.0;
        let series = PriceSeries::new("005930", bars).unwrap();
        let err = evaluate(&series, &ScanConfig::default(), None, RelativeStrength::default())
            .unwrap_err();
        assert!(matches!(err, SkipReason::InvalidFinalBar { .. }));
    }

    #[test]
    fn zero_windows_are_rejected_not_panicking() {
        let series = flat_series(80, 10_000.0, 1_000_000);

        let mut config = ScanConfig::default();
        config.trend.adx_len = 0;
        let err = evaluate(&series, &config, None, RelativeStrength::default()).unwrap_err();
        assert!(matches!(err, SkipReason::InvalidConfig { .. }));
        assert_eq!(err.label(), "invalid_config");
        assert!(err.to_string().contains("trend.adx_len"));

        let mut config = ScanConfig::default();
        config.volume.avg_len = 0;
        let err = evaluate(&series, &config, None, RelativeStrength::default()).unwrap_err();
        assert!(err.to_string().contains("volume.avg_len"));

        let mut config = ScanConfig::default();
        config.trend.ma_periods = [20, 0, 200];
        let err = evaluate(&series, &config, None, RelativeStrength::default()).unwrap_err();
        assert!(matches!(err, SkipReason::InvalidConfig { .. }));
    }

    #[test]
    fn flat_series_scores_consistently() {
        let series = flat_series(80, 10_000.0, 1_000_000);
        let result = evaluate(&series, &ScanConfig::default(), None, RelativeStrength::default())
            .unwrap();
        assert_eq!(result.trend_score, 0);
        assert_eq!(result.supply_score, 0);
        assert_eq!(
            result.total_score,
            result.trend_score
                + result.pattern_score
                + result.volume_score
                + result.supply_score
                + result.risk_score
        );
        // trailing low 9,900 → 1% risk, full risk score
        assert_eq!(result.stop, 9_900.0);
        assert_eq!(result.risk_score, 10);
        assert_eq!(result.ma20, 10_000.0);
        assert_eq!(result.setup_tag, SetupTag::None);
    }

    #[test]
    fn weak_regime_doubles_risk_deduction() {
        let mut bars = flat_series(80, 10_000.0, 1_000_000).bars().to_vec();
        bars[75].low = 9_300.0; // 7% risk → 1 point, 2 when weak
        let series = PriceSeries::new("005930", bars).unwrap();
        let config = ScanConfig::default();
        let rs = RelativeStrength::default();

        let normal = evaluate_in_regime(&series, &config, None, rs, MarketRegime::Normal).unwrap();
        let weak = evaluate_in_regime(&series, &config, None, rs, MarketRegime::Weak).unwrap();
        assert_eq!(normal.risk_score, 9);
        assert_eq!(weak.risk_score, 8);
    }

    #[test]
    fn detailed_carries_strategies() {
        let series = flat_series(80, 10_000.0, 1_000_000);
        let eval = evaluate_detailed(
            &series,
            &ScanConfig::default(),
            None,
            RelativeStrength::default(),
            MarketRegime::Normal,
        )
        .unwrap();
        assert_eq!(eval.strategies.len(), 3);
        assert_eq!(eval.result.sub_scores().total(), eval.result.total_score);
    }
}
