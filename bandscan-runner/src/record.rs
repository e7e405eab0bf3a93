//! Persisted scan record: one CSV row per symbol per scan date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bandscan_core::data::Listing;
use bandscan_core::ScoreResult;

/// Column order of every partial and merged output file.
pub const COLUMNS: [&str; 19] = [
    "code",
    "name",
    "market",
    "sector",
    "close",
    "stop",
    "risk_pct",
    "trend_score",
    "pattern_score",
    "volume_score",
    "supply_score",
    "risk_score",
    "total_score",
    "setup",
    "ma20",
    "ma60",
    "bb_upper",
    "scan_date",
    "chunk",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub code: String,
    pub name: String,
    pub market: String,
    pub sector: String,
    pub close: f64,
    pub stop: f64,
    /// Percent of close (8.0 = 8%).
    pub risk_pct: f64,
    pub trend_score: u32,
    pub pattern_score: u32,
    pub volume_score: u32,
    pub supply_score: u32,
    pub risk_score: u32,
    pub total_score: u32,
    pub setup: String,
    pub ma20: f64,
    pub ma60: f64,
    pub bb_upper: f64,
    pub scan_date: NaiveDate,
    pub chunk: usize,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl ScanRecord {
    pub fn new(listing: &Listing, result: &ScoreResult, scan_date: NaiveDate, chunk: usize) -> Self {
        Self {
            code: listing.code.clone(),
            name: listing.name.clone(),
            market: listing.market.clone(),
            sector: listing.sector.clone(),
            close: result.close,
            stop: round2(result.stop),
            risk_pct: round2(result.risk_pct * 100.0),
            trend_score: result.trend_score,
            pattern_score: result.pattern_score,
            volume_score: result.volume_score,
            supply_score: result.supply_score,
            risk_score: result.risk_score,
            total_score: result.total_score,
            setup: result.setup_tag.as_str().to_string(),
            ma20: round2(result.ma20),
            ma60: round2(result.ma60),
            bb_upper: round2(result.bb_upper),
            scan_date,
            chunk,
        }
    }
}
