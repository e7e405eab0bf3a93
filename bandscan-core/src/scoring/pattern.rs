//! Pattern/location sub-score.
//!
//! Canonical: door knock, squeeze and memory proximity at 10 points each, plus
//! `rs_weight` for each relative-strength horizon at or above `rs_threshold`.
//! Legacy: trigger points (R 15, B 10, A 8, C 5) plus 5 for a live squeeze.

use crate::config::{ScoringConfig, ScoringPolicy};
use crate::domain::RelativeStrength;
use crate::signals::FinalBar;

const LOCATION_POINTS: u32 = 10;

const LEGACY_REBREAKOUT: u32 = 15;
const LEGACY_TRIGGER_B: u32 = 10;
const LEGACY_TRIGGER_A: u32 = 8;
const LEGACY_TRIGGER_C: u32 = 5;
const LEGACY_SQUEEZE: u32 = 5;

fn points(flag: bool, value: u32) -> u32 {
    if flag {
        value
    } else {
        0
    }
}

pub fn pattern_score(fb: &FinalBar, rs: RelativeStrength, weights: &ScoringConfig) -> u32 {
    let raw = match weights.policy {
        ScoringPolicy::Canonical => {
            points(fb.door_knock, LOCATION_POINTS)
                + points(fb.squeeze, LOCATION_POINTS)
                + points(fb.memory_near, LOCATION_POINTS)
                + points(rs.rs_3m >= weights.rs_threshold, weights.rs_weight)
                + points(rs.rs_6m >= weights.rs_threshold, weights.rs_weight)
        }
        ScoringPolicy::Legacy => {
            points(fb.rebreakout, LEGACY_REBREAKOUT)
                + points(fb.trigger_b, LEGACY_TRIGGER_B)
                + points(fb.trigger_a, LEGACY_TRIGGER_A)
                + points(fb.trigger_c, LEGACY_TRIGGER_C)
                + points(fb.squeeze, LEGACY_SQUEEZE)
        }
    };
    raw.min(weights.pattern_weight)
}
