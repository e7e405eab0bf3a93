//! Final-bar snapshot: the one place where indeterminate values get defaults.
//!
//! | field                         | default when indeterminate |
//! |-------------------------------|----------------------------|
//! | moving averages, upper band   | close                      |
//! | ADX                           | 0                          |
//! | bandwidth rank                | none (squeeze is false)    |
//! | volume ratio                  | 0                          |
//! | flags and triggers            | false                      |
//! | dry-up count                  | 0                          |
//! | climax high/low, ATR          | none                       |

use chrono::NaiveDate;

use super::SignalSet;
use crate::domain::Bar;
use crate::indicators::value_at;

/// Resolved view of one bar, read by the scorer, risk calculator and strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// The bar before this one, when there is one.
    pub prev: Option<Bar>,

    pub ma_fast: f64,
    pub ma_mid: f64,
    pub ma_slow: f64,
    pub ma10: f64,
    pub ma60: f64,
    pub bb_upper: f64,
    pub adx: f64,
    pub bandwidth_rank: Option<f64>,
    pub vol_avg: Option<f64>,
    pub volume_ratio: f64,
    pub atr20: Option<f64>,

    pub door_knock: bool,
    pub squeeze: bool,
    pub memory_near: bool,
    pub past_explosion: bool,
    pub breakout: bool,
    pub rebreakout: bool,
    pub volume_confirm: bool,
    pub trigger_a: bool,
    pub trigger_b: bool,
    pub trigger_c: bool,
    pub dryup_count: usize,

    /// Latest climax levels at or before this bar.
    pub climax_high: Option<f64>,
    pub climax_low: Option<f64>,
    /// Climax low carried through the previous bar (the Trigger-B reference).
    pub prior_climax_low: Option<f64>,
}

fn flag(series: &[Option<bool>], index: usize) -> bool {
    series.get(index).copied().flatten().unwrap_or(false)
}

impl FinalBar {
    /// Resolve the bar at `index`. `None` when `index` is out of range.
    pub fn resolve(bars: &[Bar], signals: &SignalSet, index: usize) -> Option<Self> {
        let bar = bars.get(index)?;
        let close = bar.close;
        let or_close = |series: &[f64]| value_at(series, index).unwrap_or(close);

        let vol_avg = value_at(&signals.vol_avg, index);
        let volume = bar.volume as f64;
        let volume_ratio = match vol_avg {
            Some(avg) if avg > 0.0 => volume / avg,
            _ => 0.0,
        };

        Some(Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close,
            volume,
            prev: index.checked_sub(1).and_then(|p| bars.get(p)).copied(),
            ma_fast: or_close(&signals.ma_fast),
            ma_mid: or_close(&signals.ma_mid),
            ma_slow: or_close(&signals.ma_slow),
            ma10: or_close(&signals.ma10),
            ma60: or_close(&signals.ma60),
            bb_upper: or_close(&signals.bands.upper),
            adx: value_at(&signals.adx, index).unwrap_or(0.0),
            bandwidth_rank: value_at(&signals.bandwidth_rank, index),
            vol_avg,
            volume_ratio,
            atr20: value_at(&signals.atr20, index),
            door_knock: flag(&signals.door_knock, index),
            squeeze: flag(&signals.squeeze, index),
            memory_near: flag(&signals.memory_near, index),
            past_explosion: flag(&signals.past_explosion, index),
            breakout: flag(&signals.breakout, index),
            rebreakout: flag(&signals.rebreakout, index),
            volume_confirm: flag(&signals.volume_confirm, index),
            trigger_a: flag(&signals.trigger_a, index),
            trigger_b: flag(&signals.trigger_b, index),
            trigger_c: flag(&signals.trigger_c, index),
            dryup_count: signals.dryup_count.get(index).copied().flatten().unwrap_or(0),
            climax_high: signals.climax_high.get(index).copied().flatten(),
            climax_low: signals.climax_low.get(index).copied().flatten(),
            prior_climax_low: signals.prior_climax_low(index),
        })
    }

    /// Resolve the last bar of the series.
    pub fn last(bars: &[Bar], signals: &SignalSet) -> Option<Self> {
        Self::resolve(bars, signals, bars.len().checked_sub(1)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::indicators::make_bars;

    #[test]
    fn warmup_values_fall_back_to_defaults() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);
        let signals = SignalSet::compute(&bars, &ScanConfig::default());
        let fb = FinalBar::last(&bars, &signals).unwrap();

        assert_eq!(fb.ma_fast, 102.0);
        assert_eq!(fb.ma_slow, 102.0);
        assert_eq!(fb.ma60, 102.0);
        assert_eq!(fb.bb_upper, 102.0);
        assert_eq!(fb.adx, 0.0);
        assert_eq!(fb.bandwidth_rank, None);
        assert_eq!(fb.volume_ratio, 0.0);
        assert_eq!(fb.dryup_count, 0);
        assert!(!fb.squeeze && !fb.door_knock && !fb.memory_near);
        assert!(!fb.trigger_a && !fb.trigger_b && !fb.trigger_c);
        assert_eq!(fb.climax_low, None);
        assert_eq!(fb.atr20, None);
        assert_eq!(fb.prev.map(|b| b.close), Some(101.0));
    }

    #[test]
    fn resolved_values_pass_through() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let signals = SignalSet::compute(&bars, &ScanConfig::default());
        let fb = FinalBar::last(&bars, &signals).unwrap();

        // mean of 110..=129
        assert!((fb.ma_fast - 119.5).abs() < 1e-9);
        assert!((fb.volume_ratio - 1.0).abs() < 1e-12);
        assert!(fb.atr20.is_some());
    }

    #[test]
    fn empty_series_has_no_final_bar() {
        let signals = SignalSet::compute(&[], &ScanConfig::default());
        assert!(FinalBar::last(&[], &signals).is_none());
    }
}
