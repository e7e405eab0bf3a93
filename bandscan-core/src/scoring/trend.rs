//! Trend sub-score: price above its averages, average alignment, ADX strength.

use crate::config::{ScoringConfig, ScoringPolicy};
use crate::signals::FinalBar;

const ABOVE_AVERAGE: u32 = 5;

/// ADX tiers, highest first: (minimum ADX, points).
const ADX_TIERS: [(f64, u32); 4] = [(40.0, 5), (30.0, 4), (25.0, 3), (20.0, 2)];

pub fn adx_points(adx: f64) -> u32 {
    ADX_TIERS
        .iter()
        .find(|(min, _)| adx >= *min)
        .map(|(_, points)| *points)
        .unwrap_or(0)
}

/// Alignment bonuses (fast > mid, mid > slow) for a policy.
fn alignment_points(policy: ScoringPolicy) -> (u32, u32) {
    match policy {
        ScoringPolicy::Canonical => (3, 2),
        ScoringPolicy::Legacy => (5, 3),
    }
}

pub fn trend_score(fb: &FinalBar, weights: &ScoringConfig) -> u32 {
    let mut score = 0;
    for ma in [fb.ma_fast, fb.ma_mid, fb.ma_slow] {
        if fb.close > ma {
            score += ABOVE_AVERAGE;
        }
    }

    let (fast_over_mid, mid_over_slow) = alignment_points(weights.policy);
    if fb.ma_fast > fb.ma_mid {
        score += fast_over_mid;
    }
    if fb.ma_mid > fb.ma_slow {
        score += mid_over_slow;
    }

    score += adx_points(fb.adx);
    score.min(weights.trend_weight)
}
