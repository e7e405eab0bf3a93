//! Strategy recommender: three entry/stop candidates ranked for a report.
//!
//! Reads only the resolved final bar; never feeds back into the score.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::signals::FinalBar;

const PULLBACK_ATR_MULT: f64 = 1.2;
const PULLBACK_FALLBACK: f64 = 0.97;
const PULLBACK_BAND: (f64, f64) = (-0.02, 0.04);

const BREAKOUT_ATR_MULT: f64 = 1.5;
const BREAKOUT_FALLBACK: f64 = 0.95;
const BREAKOUT_CHASE: f64 = 1.02;
const BREAKOUT_PROXIMITY: f64 = 0.98;

const PIVOT_FALLBACK: f64 = 0.93;
const PIVOT_VOLUME_MULT: f64 = 2.0;
const PIVOT_MIN_GAIN: f64 = 1.04;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Pullback,
    Breakout,
    MomentumPivot,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyKind::Pullback => "pullback",
            StrategyKind::Breakout => "breakout",
            StrategyKind::MomentumPivot => "momentum-pivot",
        };
        f.write_str(s)
    }
}

/// Short-term price pattern that arms the momentum-pivot candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotPattern {
    /// Today's range sits inside yesterday's; entry on a break of today's high.
    InsideDay,
    /// Opened below yesterday's low and closed back above it.
    GapReversal,
    /// Heavy volume with a strong up close.
    VolumePivot,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyCandidate {
    pub kind: StrategyKind,
    pub entry: f64,
    pub stop: f64,
    /// `(entry - stop) / entry`.
    pub risk_pct: f64,
    pub active: bool,
    pub pattern: Option<PivotPattern>,
}

impl StrategyCandidate {
    fn new(kind: StrategyKind, entry: f64, stop: f64, active: bool) -> Self {
        let risk_pct = if entry > 0.0 { (entry - stop) / entry } else { 0.0 };
        Self {
            kind,
            entry,
            stop,
            risk_pct,
            active,
            pattern: None,
        }
    }
}

/// Keep `stop` only if it sits strictly below `entry`; otherwise use the fallback.
fn guarded_stop(stop: Option<f64>, entry: f64, fallback_mult: f64) -> f64 {
    match stop {
        Some(s) if s.is_finite() && s < entry => s,
        _ => entry * fallback_mult,
    }
}

pub fn pullback(fb: &FinalBar) -> StrategyCandidate {
    let entry = fb.ma_fast;
    let atr_stop = fb.atr20.map(|atr| entry - PULLBACK_ATR_MULT * atr);
    let stop = match (atr_stop, fb.climax_low) {
        (Some(a), Some(c)) => Some(a.max(c)),
        (Some(a), None) => Some(a),
        (None, c) => c,
    };
    let stop = guarded_stop(stop, entry, PULLBACK_FALLBACK);

    let active = entry > 0.0 && {
        let distance = (fb.close - entry) / entry;
        distance >= PULLBACK_BAND.0 && distance <= PULLBACK_BAND.1
    };
    StrategyCandidate::new(StrategyKind::Pullback, entry, stop, active)
}

pub fn breakout(fb: &FinalBar) -> StrategyCandidate {
    let entry = if fb.bb_upper > fb.close {
        fb.bb_upper
    } else {
        fb.close * BREAKOUT_CHASE
    };
    let stop = guarded_stop(
        fb.atr20.map(|atr| entry - BREAKOUT_ATR_MULT * atr),
        entry,
        BREAKOUT_FALLBACK,
    );
    let active = fb.close >= BREAKOUT_PROXIMITY * fb.bb_upper;
    StrategyCandidate::new(StrategyKind::Breakout, entry, stop, active)
}

/// First matching pivot pattern and its entry price.
pub fn detect_pivot(fb: &FinalBar) -> Option<(PivotPattern, f64)> {
    let prev = fb.prev?;
    if fb.high < prev.high && fb.low > prev.low {
        return Some((PivotPattern::InsideDay, fb.high));
    }
    if fb.open < prev.low && fb.close > prev.low {
        return Some((PivotPattern::GapReversal, fb.close));
    }
    let heavy = fb.vol_avg.is_some_and(|avg| fb.volume > PIVOT_VOLUME_MULT * avg);
    if heavy && fb.close >= PIVOT_MIN_GAIN * prev.close {
        return Some((PivotPattern::VolumePivot, fb.close));
    }
    None
}

pub fn momentum_pivot(fb: &FinalBar) -> StrategyCandidate {
    let detected = detect_pivot(fb);
    let entry = detected.map(|(_, e)| e).unwrap_or(fb.high);
    let raw = match fb.atr20 {
        Some(atr) => fb.ma10.max(entry - atr),
        None => fb.ma10,
    };
    let stop = guarded_stop(Some(raw), entry, PIVOT_FALLBACK);

    let mut candidate =
        StrategyCandidate::new(StrategyKind::MomentumPivot, entry, stop, detected.is_some());
    candidate.pattern = detected.map(|(p, _)| p);
    candidate
}

/// All three candidates, ranked: active first, then lower risk.
///
/// The sort is stable, so ties keep pullback, breakout, momentum order.
pub fn recommend(fb: &FinalBar) -> Vec<StrategyCandidate> {
    let mut candidates = vec![pullback(fb), breakout(fb), momentum_pivot(fb)];
    candidates.sort_by(|a, b| {
        b.active
            .cmp(&a.active)
            .then(a.risk_pct.total_cmp(&b.risk_pct))
    });
    candidates
}
