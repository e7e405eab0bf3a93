//! Scan configuration.
//!
//! Every section is `#[serde(default)]`, so a TOML file only needs to name the
//! fields it overrides. Defaults are the values the daily KRX scan runs with.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for one scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub bollinger: BollingerConfig,
    pub trend: TrendConfig,
    pub volume: VolumeConfig,
    pub volume_dryup: DryupConfig,
    pub patterns: PatternConfig,
    pub setup: SetupConfig,
    pub risk: RiskConfig,
    pub scoring: ScoringConfig,
    pub universe: UniverseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerConfig {
    pub length: usize,
    pub stdev: f64,
    pub bandwidth_lookback: usize,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            length: 60,
            stdev: 2.0,
            bandwidth_lookback: 60,
        }
    }
}

/// How +DM/−DM/TR and DX are smoothed inside ADX.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdxSmoothing {
    #[default]
    RollingMean,
    Wilder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub adx_len: usize,
    pub adx_min: f64,
    /// Short, medium and long trend averages, in that order.
    pub ma_periods: [usize; 3],
    pub adx_smoothing: AdxSmoothing,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            adx_len: 14,
            adx_min: 20.0,
            ma_periods: [20, 50, 200],
            adx_smoothing: AdxSmoothing::RollingMean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Volume average window used by every volume ratio.
    pub avg_len: usize,
    pub climax_mult: f64,
    pub vol_confirm_mult: f64,
    pub explosion_mult: f64,
    /// Trailing window searched for a past explosion bar.
    pub explosion_lookback: usize,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            avg_len: 20,
            climax_mult: 5.0,
            vol_confirm_mult: 1.5,
            explosion_mult: 3.0,
            explosion_lookback: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DryupConfig {
    /// A bar is dry when volume < threshold_pct × volume average.
    pub threshold_pct: f64,
    pub lookback_days: usize,
    pub min_dryup_days: usize,
    pub strong_dryup_days: usize,
}

impl Default for DryupConfig {
    fn default() -> Self {
        Self {
            threshold_pct: 0.7,
            lookback_days: 15,
            min_dryup_days: 3,
            strong_dryup_days: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Door knock band, as multiples of the upper Bollinger band.
    pub door_knock_lower: f64,
    pub door_knock_upper: f64,
    /// Squeeze when the bandwidth percentile rank is at or below this.
    pub squeeze_pct: f64,
    pub memory_lookback: usize,
    pub memory_tolerance: f64,
    pub rebreakout_lookback: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            door_knock_lower: 0.95,
            door_knock_upper: 1.02,
            squeeze_pct: 20.0,
            memory_lookback: 60,
            memory_tolerance: 0.05,
            rebreakout_lookback: 60,
        }
    }
}

/// Which rule reduces the signal set to a setup tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupPolicy {
    /// First matching trigger wins: R > B > A > C.
    #[default]
    Priority,
    /// Count of door-knock, squeeze and memory conditions.
    ConditionCount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    pub policy: SetupPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub stop_lookback: usize,
    pub max_risk_pct: f64,
    pub default_risk_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            stop_lookback: 10,
            max_risk_pct: 0.15,
            default_risk_pct: 0.08,
        }
    }
}

/// Which point table feeds the trend and pattern sub-scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Door knock + squeeze + memory location scoring with RS bonus.
    #[default]
    Canonical,
    /// Trigger-based pattern scoring (re-breakout, climax, squeeze, MA20).
    Legacy,
}

/// Sub-score caps. The five caps must sum to at most 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub trend_weight: u32,
    pub pattern_weight: u32,
    pub volume_weight: u32,
    pub supply_weight: u32,
    pub risk_weight: u32,
    /// Bonus per relative-strength horizon at or above `rs_threshold`.
    pub rs_weight: u32,
    pub rs_threshold: u8,
    pub policy: ScoringPolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            trend_weight: 25,
            pattern_weight: 30,
            volume_weight: 20,
            supply_weight: 15,
            risk_weight: 10,
            rs_weight: 5,
            rs_threshold: 80,
            policy: ScoringPolicy::Canonical,
        }
    }
}

impl ScoringConfig {
    pub fn total_weight(&self) -> u32 {
        self.trend_weight
            + self.pattern_weight
            + self.volume_weight
            + self.supply_weight
            + self.risk_weight
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    /// Skip symbols whose last close is below this price.
    pub min_close: f64,
    /// Skip symbols whose 20-day average traded value is below this.
    pub min_adv20_value: f64,
    /// Universe filter: drop listings under this market cap.
    pub min_market_cap: f64,
    pub exclude_preferred: bool,
    pub exclude_spac: bool,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            min_close: 1_000.0,
            min_adv20_value: 1_000_000_000.0,
            min_market_cap: 0.0,
            exclude_preferred: true,
            exclude_spac: true,
        }
    }
}

/// Minimum bars before any symbol is scored.
pub const MIN_HISTORY: usize = 60;

impl ScanConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check the invariants the scorer relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("bollinger.length", self.bollinger.length),
            ("bollinger.bandwidth_lookback", self.bollinger.bandwidth_lookback),
            ("trend.adx_len", self.trend.adx_len),
            ("volume.avg_len", self.volume.avg_len),
            ("volume_dryup.lookback_days", self.volume_dryup.lookback_days),
            ("volume.explosion_lookback", self.volume.explosion_lookback),
            ("patterns.memory_lookback", self.patterns.memory_lookback),
            ("patterns.rebreakout_lookback", self.patterns.rebreakout_lookback),
            ("risk.stop_lookback", self.risk.stop_lookback),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be >= 1")));
            }
        }
        if self.trend.ma_periods.contains(&0) {
            return Err(ConfigError::Invalid("trend.ma_periods must be >= 1".into()));
        }
        if self.bollinger.stdev.is_nan() || self.bollinger.stdev < 0.0 {
            return Err(ConfigError::Invalid("bollinger.stdev must be >= 0".into()));
        }
        if self.patterns.door_knock_lower > self.patterns.door_knock_upper {
            return Err(ConfigError::Invalid(format!(
                "patterns.door_knock_lower ({}) exceeds door_knock_upper ({})",
                self.patterns.door_knock_lower, self.patterns.door_knock_upper
            )));
        }
        if !(self.risk.default_risk_pct > 0.0
            && self.risk.default_risk_pct <= self.risk.max_risk_pct
            && self.risk.max_risk_pct < 1.0)
        {
            return Err(ConfigError::Invalid(
                "risk requires 0 < default_risk_pct <= max_risk_pct < 1".into(),
            ));
        }
        let total = self.scoring.total_weight();
        if total > 100 {
            return Err(ConfigError::Invalid(format!(
                "scoring weights sum to {total}, must be <= 100"
            )));
        }
        Ok(())
    }

    /// Bars required before a symbol can be scored.
    pub fn required_history(&self) -> usize {
        self.bollinger.length.max(MIN_HISTORY)
    }

    /// Deterministic BLAKE3 fingerprint of the configuration.
    ///
    /// Two scans stamped with the same fingerprint scored with identical rules.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bollinger.length, 60);
        assert_eq!(config.bollinger.stdev, 2.0);
        assert_eq!(config.trend.adx_min, 20.0);
        assert_eq!(config.scoring.total_weight(), 100);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = ScanConfig::from_toml(
            r#"
[bollinger]
length = 20

[patterns]
door_knock_upper = 1.05

[scoring]
policy = "legacy"
"#,
        )
        .unwrap();
        assert_eq!(config.bollinger.length, 20);
        assert_eq!(config.bollinger.stdev, 2.0);
        assert_eq!(config.patterns.door_knock_upper, 1.05);
        assert_eq!(config.patterns.door_knock_lower, 0.95);
        assert_eq!(config.scoring.policy, ScoringPolicy::Legacy);
        assert_eq!(config.setup.policy, SetupPolicy::Priority);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(ScanConfig::from_toml("").unwrap(), ScanConfig::default());
    }

    #[test]
    fn rejects_overweight_scoring() {
        let err = ScanConfig::from_toml("[scoring]\ntrend_weight = 40\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_inverted_door_knock_band() {
        let err = ScanConfig::from_toml(
            "[patterns]\ndoor_knock_lower = 1.1\ndoor_knock_upper = 1.0\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_window() {
        let err = ScanConfig::from_toml("[trend]\nadx_len = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let config = ScanConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(ScanConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn fingerprint_tracks_changes() {
        let a = ScanConfig::default();
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.patterns.door_knock_upper = 1.05;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn required_history_covers_band_length() {
        let mut config = ScanConfig::default();
        assert_eq!(config.required_history(), 60);
        config.bollinger.length = 120;
        assert_eq!(config.required_history(), 120);
    }
}
