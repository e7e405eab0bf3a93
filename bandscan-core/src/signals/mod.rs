//! Pattern detection: derived per-bar signals for one price series.
//!
//! A `SignalSet` is computed once per evaluation from the bar history and the
//! scan config, then read at the final bar through [`FinalBar`]. Numeric series
//! carry NaN and flag series carry `None` during warm-up; neither is resolved to
//! a concrete value until `FinalBar::resolve`.

pub mod final_bar;
pub mod patterns;

pub use final_bar::FinalBar;

use crate::config::ScanConfig;
use crate::domain::Bar;
use crate::indicators::{
    bandwidth, percentile_rank, Adx, Atr, Bollinger, BollingerBands, Indicator, Sma,
};
use patterns::{
    all_of, any_within, carry_forward, compare, near_anchor, rebreakout, trailing_count,
    volume_anchor, volume_multiple,
};

/// Period of the short average the momentum-pivot stop rides on.
pub const MA_SHORT: usize = 10;
/// Period of the reference average reported alongside every score.
pub const MA_REFERENCE: usize = 60;
/// Period of the true-range average used for strategy stops.
pub const ATR_PERIOD: usize = 20;

/// Every derived series for one symbol, index-aligned with its bars.
#[derive(Debug, Clone)]
pub struct SignalSet {
    pub bands: BollingerBands,
    pub bandwidth: Vec<f64>,
    pub bandwidth_rank: Vec<f64>,
    pub adx: Vec<f64>,
    /// Averages at the configured `trend.ma_periods` (20/50/200 by default).
    pub ma_fast: Vec<f64>,
    pub ma_mid: Vec<f64>,
    pub ma_slow: Vec<f64>,
    pub ma10: Vec<f64>,
    pub ma60: Vec<f64>,
    pub atr20: Vec<f64>,
    pub vol_avg: Vec<f64>,

    pub climax: Vec<Option<bool>>,
    /// High of the most recent climax bar at or before each bar.
    pub climax_high: Vec<Option<f64>>,
    /// Low of the most recent climax bar at or before each bar.
    pub climax_low: Vec<Option<f64>>,
    pub door_knock: Vec<Option<bool>>,
    pub squeeze: Vec<Option<bool>>,
    pub memory_anchor: Vec<Option<f64>>,
    pub memory_near: Vec<Option<bool>>,
    pub explosion: Vec<Option<bool>>,
    pub past_explosion: Vec<Option<bool>>,
    pub dry: Vec<Option<bool>>,
    pub dryup_count: Vec<Option<usize>>,
    pub breakout: Vec<Option<bool>>,
    pub rebreakout: Vec<Option<bool>>,
    pub volume_confirm: Vec<Option<bool>>,
    pub trend_strength: Vec<Option<bool>>,
    pub trigger_a: Vec<Option<bool>>,
    pub trigger_b: Vec<Option<bool>>,
    pub trigger_c: Vec<Option<bool>>,
}

impl SignalSet {
    pub fn compute(bars: &[Bar], config: &ScanConfig) -> Self {
        let n = bars.len();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

        // Indicator engine
        let bands = Bollinger::bands(config.bollinger.length, config.bollinger.stdev, bars);
        let bandwidth = bandwidth(&bands);
        let bandwidth_rank = percentile_rank(&bandwidth, config.bollinger.bandwidth_lookback);
        let adx = Adx::with_smoothing(config.trend.adx_len, config.trend.adx_smoothing).compute(bars);
        let [fast, mid, slow] = config.trend.ma_periods;
        let ma_fast = Sma::new(fast).compute(bars);
        let ma_mid = Sma::new(mid).compute(bars);
        let ma_slow = Sma::new(slow).compute(bars);
        let ma10 = Sma::new(MA_SHORT).compute(bars);
        let ma60 = Sma::new(MA_REFERENCE).compute(bars);
        let atr20 = Atr::new(ATR_PERIOD).compute(bars);
        let vol_avg = Sma::volume(config.volume.avg_len).compute(bars);

        // Climax bars and their carried levels
        let climax = volume_multiple(&volumes, &vol_avg, config.volume.climax_mult);
        let climax_high = carry_forward(&climax, &highs);
        let climax_low = carry_forward(&climax, &lows);

        // Location
        let patterns = &config.patterns;
        let door_knock = (0..n)
            .map(|i| {
                let upper = bands.upper[i];
                if upper.is_nan() || closes[i].is_nan() {
                    None
                } else {
                    let c = closes[i];
                    Some(c >= upper * patterns.door_knock_lower && c <= upper * patterns.door_knock_upper)
                }
            })
            .collect();
        let squeeze = compare(&bandwidth_rank, |r| r <= patterns.squeeze_pct);
        let memory_anchor = volume_anchor(&closes, &volumes, patterns.memory_lookback);
        let memory_near = near_anchor(&closes, &memory_anchor, patterns.memory_tolerance);

        // Volume
        let explosion = volume_multiple(&volumes, &vol_avg, config.volume.explosion_mult);
        let past_explosion = any_within(&explosion, config.volume.explosion_lookback);
        let dry = (0..n)
            .map(|i| {
                let avg = vol_avg[i];
                if avg.is_nan() {
                    None
                } else {
                    Some(volumes[i] < config.volume_dryup.threshold_pct * avg)
                }
            })
            .collect::<Vec<_>>();
        let dryup_count = trailing_count(&dry, config.volume_dryup.lookback_days);
        let volume_confirm = volume_multiple(&volumes, &vol_avg, config.volume.vol_confirm_mult);

        // Breakouts
        let breakout: Vec<Option<bool>> = (0..n)
            .map(|i| {
                let upper = bands.upper[i];
                if upper.is_nan() || closes[i].is_nan() {
                    None
                } else {
                    Some(closes[i] > upper)
                }
            })
            .collect();
        let rebreakout = rebreakout(&breakout, patterns.rebreakout_lookback);

        // Setup triggers
        let adx_min = config.trend.adx_min;
        let trend_strength = compare(&adx, |v| v >= adx_min);
        let trigger_a = (0..n)
            .map(|i| all_of(&[squeeze[i], breakout[i], volume_confirm[i], trend_strength[i]]))
            .collect();
        let trigger_b = (0..n)
            .map(|i| {
                let prior_high = i.checked_sub(1).and_then(|p| climax_high[p]);
                let cleared = prior_high.map(|h| closes[i] > h);
                all_of(&[cleared, volume_confirm[i]])
            })
            .collect();
        let trigger_c = (0..n)
            .map(|i| {
                let crossed = i.checked_sub(1).and_then(|p| {
                    let (pc, pm, m) = (closes[p], ma_fast[p], ma_fast[i]);
                    if pc.is_nan() || pm.is_nan() || m.is_nan() {
                        None
                    } else {
                        Some(pc <= pm && closes[i] > m)
                    }
                });
                all_of(&[crossed, volume_confirm[i], trend_strength[i]])
            })
            .collect();

        Self {
            bands,
            bandwidth,
            bandwidth_rank,
            adx,
            ma_fast,
            ma_mid,
            ma_slow,
            ma10,
            ma60,
            atr20,
            vol_avg,
            climax,
            climax_high,
            climax_low,
            door_knock,
            squeeze,
            memory_anchor,
            memory_near,
            explosion,
            past_explosion,
            dry,
            dryup_count,
            breakout,
            rebreakout,
            volume_confirm,
            trend_strength,
            trigger_a,
            trigger_b,
            trigger_c,
        }
    }

    /// Number of bars the set is aligned with.
    pub fn len(&self) -> usize {
        self.adx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adx.is_empty()
    }

    /// Climax high carried through the bar before `index`.
    pub fn prior_climax_high(&self, index: usize) -> Option<f64> {
        index.checked_sub(1).and_then(|p| self.climax_high[p])
    }

    /// Climax low carried through the bar before `index`.
    pub fn prior_climax_low(&self, index: usize) -> Option<f64> {
        index.checked_sub(1).and_then(|p| self.climax_low[p])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn small_config() -> ScanConfig {
        let mut config = ScanConfig::default();
        config.bollinger.length = 5;
        config.bollinger.bandwidth_lookback = 5;
        config.trend.adx_len = 3;
        config.trend.ma_periods = [3, 5, 8];
        config.volume.avg_len = 3;
        config.volume.explosion_lookback = 5;
        config.volume_dryup.lookback_days = 4;
        config.patterns.memory_lookback = 5;
        config.patterns.rebreakout_lookback = 5;
        config
    }

    fn with_volumes(closes: &[f64], volumes: &[u64]) -> Vec<Bar> {
        let mut bars = make_bars(closes);
        for (bar, &v) in bars.iter_mut().zip(volumes) {
            bar.volume = v;
        }
        bars
    }

    #[test]
    fn every_series_is_aligned() {
        let bars = make_bars(&(0..40).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let set = SignalSet::compute(&bars, &ScanConfig::default());
        assert_eq!(set.len(), 40);
        assert_eq!(set.bands.upper.len(), 40);
        assert_eq!(set.ma60.len(), 40);
        assert_eq!(set.trigger_c.len(), 40);
        assert_eq!(set.dryup_count.len(), 40);
        // 60-bar bands never warm up on 40 bars
        assert!(set.breakout.iter().all(Option::is_none));
    }

    #[test]
    fn climax_levels_carry_forward() {
        let mut config = small_config();
        config.volume.climax_mult = 2.0;
        let closes = [100.0, 100.0, 100.0, 100.0, 101.0, 102.0];
        let bars = with_volumes(&closes, &[1000, 1000, 1000, 4000, 1000, 1000]);
        let set = SignalSet::compute(&bars, &config);

        assert_eq!(set.climax[2], Some(false));
        assert_eq!(set.climax[3], Some(true));
        assert_eq!(set.climax_high[2], None);
        assert_eq!(set.climax_high[5], Some(bars[3].high));
        assert_eq!(set.climax_low[5], Some(bars[3].low));
    }

    #[test]
    fn trigger_b_clears_prior_climax_high() {
        let mut config = small_config();
        config.volume.climax_mult = 2.0;
        config.volume.vol_confirm_mult = 1.0;
        let closes = [100.0, 100.0, 100.0, 100.0, 99.0, 103.0];
        let bars = with_volumes(&closes, &[1000, 1000, 1000, 4000, 1000, 3000]);
        let set = SignalSet::compute(&bars, &config);

        // bar 3: avg = 2000, 4000 >= 2 * 2000
        assert_eq!(set.climax[3], Some(true));
        assert_eq!(set.prior_climax_high(5), Some(bars[3].high));
        // bar 5: close 103 > high 101, volume 3000 >= avg 2666
        assert_eq!(set.trigger_b[5], Some(true));
        // no climax before bar 3
        assert_eq!(set.trigger_b[3], None);
    }

    #[test]
    fn dryup_counts_quiet_bars() {
        let closes = [100.0; 8];
        let bars = with_volumes(&closes, &[1000, 1000, 1000, 100, 100, 100, 1000, 1000]);
        let set = SignalSet::compute(&bars, &small_config());
        assert_eq!(set.dry[2], Some(false));
        assert_eq!(set.dry[3], Some(true));
        // the average catches up by bar 5, so only bars 3 and 4 are dry
        assert_eq!(set.dry[5], Some(false));
        assert_eq!(set.dryup_count[5], Some(2));
        assert_eq!(set.dryup_count[2], None);
    }

    /// Rising zigzag: 20 wide swings, 10 tight ones, then a close of 120.
    fn squeeze_then_breakout(last_volume: u64) -> Vec<Bar> {
        let mut closes: Vec<f64> = (0..30)
            .map(|i| {
                let swing = if i < 20 { 10.0 } else { 1.0 };
                100.0 + 0.5 * i as f64 + if i % 2 == 1 { swing } else { 0.0 }
            })
            .collect();
        closes.push(120.0);
        let mut volumes = vec![1000; 30];
        volumes.push(last_volume);
        with_volumes(&closes, &volumes)
    }

    fn squeeze_config() -> ScanConfig {
        let mut config = small_config();
        config.bollinger.length = 10;
        config.bollinger.stdev = 1.5;
        config.bollinger.bandwidth_lookback = 20;
        config
    }

    #[test]
    fn squeeze_breakout_fires_trigger_a() {
        let set = SignalSet::compute(&squeeze_then_breakout(3000), &squeeze_config());

        // the tight swings hold the band width in the bottom of its 20-bar range
        assert_eq!(set.squeeze[30], Some(true));
        assert!(set.bandwidth_rank[30] <= 20.0);
        assert_eq!(set.breakout[30], Some(true));
        // 3000 >= 1.5 × 1666
        assert_eq!(set.volume_confirm[30], Some(true));
        assert_eq!(set.trend_strength[30], Some(true));
        assert_eq!(set.trigger_a[30], Some(true));
    }

    #[test]
    fn squeeze_breakout_without_volume_is_not_trigger_a() {
        let set = SignalSet::compute(&squeeze_then_breakout(1000), &squeeze_config());
        assert_eq!(set.squeeze[30], Some(true));
        assert_eq!(set.breakout[30], Some(true));
        assert_eq!(set.volume_confirm[30], Some(false));
        assert_eq!(set.trigger_a[30], Some(false));
    }

    #[test]
    fn cross_above_fast_average_fires_trigger_c() {
        let mut closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        closes.extend([108.0, 107.0, 106.0, 110.0]);
        let mut volumes = vec![1000; 13];
        volumes.push(3000);
        let set = SignalSet::compute(&with_volumes(&closes, &volumes), &small_config());

        // bar 12 closes at its 3-bar average of 107 or below, bar 13 above 107.67
        assert!(closes[12] <= set.ma_fast[12]);
        assert!(closes[13] > set.ma_fast[13]);
        assert_eq!(set.volume_confirm[13], Some(true));
        assert_eq!(set.trend_strength[13], Some(true));
        assert_eq!(set.trigger_c[13], Some(true));
        assert_eq!(set.trigger_c[12], Some(false));
    }

    #[test]
    fn already_above_fast_average_is_not_a_cross() {
        let mut closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        closes.extend([108.0, 107.0, 109.0, 112.0]);
        let mut volumes = vec![1000; 13];
        volumes.push(3000);
        let set = SignalSet::compute(&with_volumes(&closes, &volumes), &small_config());

        assert!(closes[12] > set.ma_fast[12]);
        assert!(closes[13] > set.ma_fast[13]);
        assert_eq!(set.volume_confirm[13], Some(true));
        assert_eq!(set.trigger_c[13], Some(false));
    }

    fn breakout_pullback_breakout() -> Vec<Bar> {
        let mut closes = [100.0, 101.0].repeat(4);
        closes.extend([105.0, 103.0, 102.0, 106.0]);
        make_bars(&closes)
    }

    #[test]
    fn second_breakout_is_a_rebreakout() {
        let mut config = small_config();
        config.bollinger.stdev = 1.0;
        let set = SignalSet::compute(&breakout_pullback_breakout(), &config);

        assert_eq!(set.breakout[7], Some(false));
        // first breakout has nothing before it
        assert_eq!(set.breakout[8], Some(true));
        assert_eq!(set.rebreakout[8], Some(false));
        assert_eq!(set.breakout[9], Some(false));
        assert_eq!(set.breakout[10], Some(false));
        assert_eq!(set.breakout[11], Some(true));
        assert_eq!(set.rebreakout[11], Some(true));
    }

    #[test]
    fn rebreakout_respects_lookback() {
        let mut config = small_config();
        config.bollinger.stdev = 1.0;
        config.patterns.rebreakout_lookback = 2;
        let set = SignalSet::compute(&breakout_pullback_breakout(), &config);

        // bar 8 is three bars back, outside a 2-bar lookback
        assert_eq!(set.breakout[11], Some(true));
        assert_eq!(set.rebreakout[11], Some(false));
    }

    #[test]
    fn flat_series_never_breaks_out() {
        let bars = make_bars(&[100.0; 30]);
        let set = SignalSet::compute(&bars, &small_config());
        assert_eq!(set.breakout[29], Some(false));
        assert_eq!(set.door_knock[29], Some(true));
        assert_eq!(set.rebreakout[29], Some(false));
    }
}
