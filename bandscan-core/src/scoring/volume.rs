//! Volume sub-score: past explosion, recent dry-up, and today's activity.

use crate::config::{DryupConfig, ScoringConfig};
use crate::signals::FinalBar;

const PAST_EXPLOSION: u32 = 5;
const STRONG_DRYUP: u32 = 7;
const DRYUP: u32 = 5;

/// Points for today's volume ratio against its average.
///
/// [1.2, 2) → 5, [2, 3) → 8, ≥ 3 → 3 (overheated).
pub fn activity_points(volume_ratio: f64) -> u32 {
    if volume_ratio >= 3.0 {
        3
    } else if volume_ratio >= 2.0 {
        8
    } else if volume_ratio >= 1.2 {
        5
    } else {
        0
    }
}

pub fn dryup_points(dryup_count: usize, dryup: &DryupConfig) -> u32 {
    if dryup_count >= dryup.strong_dryup_days {
        STRONG_DRYUP
    } else if dryup_count >= dryup.min_dryup_days {
        DRYUP
    } else {
        0
    }
}

pub fn volume_score(fb: &FinalBar, dryup: &DryupConfig, weights: &ScoringConfig) -> u32 {
    let explosion = if fb.past_explosion { PAST_EXPLOSION } else { 0 };
    let raw = explosion + dryup_points(fb.dryup_count, dryup) + activity_points(fb.volume_ratio);
    raw.min(weights.volume_weight)
}
