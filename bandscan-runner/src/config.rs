//! Runner configuration: the scoring rules plus data sources, sharding and output.
//!
//! One TOML file drives a scan. Scoring sections (`[bollinger]`, `[trend]`, ...)
//! sit at the top level exactly as `ScanConfig` reads them; runner sections
//! are `[data]`, `[shard]` and `[output]`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use bandscan_core::config::{ConfigError as ScanConfigError, ScanConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read runner config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse runner config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize runner config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Scan(#[from] ScanConfigError),

    #[error("invalid runner config: {0}")]
    Invalid(String),
}

/// Where price history comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// `{csv_dir}/{code}.csv`
    #[default]
    Csv,
    /// Yahoo-style chart endpoint.
    Http,
    /// Deterministic random walks seeded by symbol code.
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub price_source: PriceSource,
    pub csv_dir: PathBuf,
    pub http_base_url: Option<String>,
    /// Appended to the code for HTTP requests (`.KS`, `.KQ`).
    pub http_symbol_suffix: String,
    pub http_timeout_secs: u64,
    pub http_retries: u32,
    /// Calendar days of history fetched before the scan date.
    pub history_days: i64,
    /// Symbol whose close vs SMA20 sets the market regime. None means `Normal`.
    pub benchmark: Option<String>,
    pub flow_file: Option<PathBuf>,
    pub secondary_flow_file: Option<PathBuf>,
    /// Base delay for the flow retry backoff.
    pub flow_retry_base_ms: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            price_source: PriceSource::Csv,
            csv_dir: PathBuf::from("data/prices"),
            http_base_url: None,
            http_symbol_suffix: ".KS".to_string(),
            http_timeout_secs: 30,
            http_retries: 3,
            history_days: 400,
            benchmark: None,
            flow_file: None,
            secondary_flow_file: None,
            flow_retry_base_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardConfig {
    pub universe_file: PathBuf,
    /// Only the largest `top_n` listings are scanned.
    pub top_n: Option<usize>,
    pub chunk_size: usize,
    /// 1-based chunk number.
    pub chunk: usize,
    /// Threads for the scan pool. None uses rayon's default.
    pub threads: Option<usize>,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            universe_file: PathBuf::from("data/universe.toml"),
            top_n: None,
            chunk_size: 500,
            chunk: 1,
            threads: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub partial_dir: PathBuf,
    /// Records scoring below this are not written.
    pub min_total_score: u32,
    /// Listings per sector averaged for the sector ranking.
    pub sector_top_members: usize,
    /// Sectors with fewer listings are not ranked.
    pub sector_min_members: usize,
    /// Only the largest listings are considered for the sector ranking.
    pub sector_universe_top_n: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            partial_dir: PathBuf::from("data/partial"),
            min_total_score: 10,
            sector_top_members: 5,
            sector_min_members: 3,
            sector_universe_top_n: 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(flatten)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub shard: ShardConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl RunnerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunnerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scan.validate()?;
        if self.shard.chunk == 0 {
            return Err(ConfigError::Invalid("shard.chunk is 1-based".into()));
        }
        if self.shard.chunk_size == 0 {
            return Err(ConfigError::Invalid("shard.chunk_size must be positive".into()));
        }
        if self.shard.threads == Some(0) {
            return Err(ConfigError::Invalid("shard.threads must be positive".into()));
        }
        if self.data.history_days <= 0 {
            return Err(ConfigError::Invalid("data.history_days must be positive".into()));
        }
        if self.output.sector_top_members == 0 {
            return Err(ConfigError::Invalid(
                "output.sector_top_members must be positive".into(),
            ));
        }
        Ok(())
    }
}
