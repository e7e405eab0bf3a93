//! Stock universe: a TOML list of listings, filtered and ordered for a scan.
//!
//! ```toml
//! [[stocks]]
//! code = "005930"
//! name = "삼성전자"
//! market = "KOSPI"
//! sector = "전기전자"
//! market_cap = 4.3e14
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::UniverseConfig;

const PREFERRED_SUFFIXES: [&str; 3] = ["우", "우B", "우C"];
const SPAC_MARKERS: [&str; 2] = ["스팩", "SPAC"];

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("failed to read universe file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse universe TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize universe: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid shard: size must be positive")]
    InvalidShardSize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub market_cap: f64,
}

impl Listing {
    pub fn is_preferred(&self) -> bool {
        let name = self.name.trim_end();
        PREFERRED_SUFFIXES.iter().any(|s| name.ends_with(s))
    }

    pub fn is_spac(&self) -> bool {
        let upper = self.name.to_uppercase();
        SPAC_MARKERS.iter().any(|m| upper.contains(m))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    #[serde(default)]
    pub stocks: Vec<Listing>,
}

impl Universe {
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, UniverseError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&Listing> {
        self.stocks.iter().find(|s| s.code == code)
    }

    /// Apply the market filters and order by market cap, largest first.
    ///
    /// The sort is stable, so equal caps keep file order.
    pub fn filtered(&self, config: &UniverseConfig) -> Universe {
        let mut stocks: Vec<Listing> = self
            .stocks
            .iter()
            .filter(|s| !(config.exclude_preferred && s.is_preferred()))
            .filter(|s| !(config.exclude_spac && s.is_spac()))
            .filter(|s| s.market_cap >= config.min_market_cap)
            .cloned()
            .collect();
        stocks.sort_by(|a, b| b.market_cap.total_cmp(&a.market_cap));
        Universe { stocks }
    }

    /// Number of shards of `size` needed to cover the universe.
    pub fn shard_count(&self, size: usize) -> usize {
        if size == 0 {
            0
        } else {
            self.stocks.len().div_ceil(size)
        }
    }

    /// Listings `[index × size, (index + 1) × size)`, clipped to the universe.
    /// An index past the end yields an empty slice.
    pub fn shard(&self, size: usize, index: usize) -> Result<&[Listing], UniverseError> {
        if size == 0 {
            return Err(UniverseError::InvalidShardSize);
        }
        let len = self.stocks.len();
        let start = index.saturating_mul(size).min(len);
        let end = start.saturating_add(size).min(len);
        Ok(&self.stocks[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(code: &str, name: &str, cap: f64) -> Listing {
        Listing {
            code: code.into(),
            name: name.into(),
            market: "KOSPI".into(),
            sector: "전기전자".into(),
            market_cap: cap,
        }
    }

    fn sample() -> Universe {
        Universe {
            stocks: vec![
                listing("000660", "SK하이닉스", 1.5e14),
                listing("005935", "삼성전자우", 4.0e13),
                listing("005930", "삼성전자", 4.3e14),
                listing("123450", "한국제7호스팩", 1.0e10),
                listing("003555", "LG우B", 5.0e11),
                listing("316140", "우리금융지주", 1.2e13),
            ],
        }
    }

    #[test]
    fn preferred_and_spac_detection() {
        assert!(listing("x", "삼성전자우", 0.0).is_preferred());
        assert!(listing("x", "LG우B", 0.0).is_preferred());
        assert!(!listing("x", "우리금융지주", 0.0).is_preferred());
        assert!(listing("x", "한국제7호스팩", 0.0).is_spac());
        assert!(listing("x", "Acme Spac 1", 0.0).is_spac());
    }

    #[test]
    fn filters_and_orders_by_cap() {
        let filtered = sample().filtered(&UniverseConfig::default());
        let codes: Vec<&str> = filtered.stocks.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["005930", "000660", "316140"]);
    }

    #[test]
    fn market_cap_floor() {
        let config = UniverseConfig {
            min_market_cap: 1.0e14,
            ..Default::default()
        };
        assert_eq!(sample().filtered(&config).len(), 2);
    }

    #[test]
    fn exclusions_can_be_disabled() {
        let config = UniverseConfig {
            exclude_preferred: false,
            exclude_spac: false,
            ..Default::default()
        };
        assert_eq!(sample().filtered(&config).len(), 6);
    }

    #[test]
    fn shards_partition_the_universe() {
        let u = sample();
        assert_eq!(u.shard_count(4), 2);
        assert_eq!(u.shard(4, 0).unwrap().len(), 4);
        assert_eq!(u.shard(4, 1).unwrap().len(), 2);
        assert!(u.shard(4, 2).unwrap().is_empty());
        assert!(matches!(u.shard(0, 0), Err(UniverseError::InvalidShardSize)));
    }

    #[test]
    fn toml_roundtrip() {
        let text = r#"
[[stocks]]
code = "005930"
name = "삼성전자"
market = "KOSPI"
sector = "전기전자"
market_cap = 4.3e14

[[stocks]]
code = "035720"
name = "카카오"
"#;
        let u = Universe::from_toml(text).unwrap();
        assert_eq!(u.len(), 2);
        assert_eq!(u.get("035720").unwrap().market_cap, 0.0);
        let back = Universe::from_toml(&u.to_toml().unwrap()).unwrap();
        assert_eq!(back, u);
    }
}
