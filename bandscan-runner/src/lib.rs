//! bandscan runner: scan orchestration on top of `bandscan-core`.
//!
//! - Runner configuration (scoring rules plus data, shard and output sections)
//! - Parallel chunk scans with relative-strength ranking and market regime
//! - Sector ranking
//! - Partial CSV output and the daily merge
//! - Synthetic price history for offline runs

pub mod config;
pub mod export;
pub mod record;
pub mod relative_strength;
pub mod scan;
pub mod sector;
pub mod synthetic;

pub use config::{ConfigError, DataConfig, OutputConfig, PriceSource, RunnerConfig, ShardConfig};
pub use export::{merge_partials, merge_records, write_partial, write_sector_rankings, MergeOutcome};
pub use record::{ScanRecord, COLUMNS};
pub use relative_strength::{percentile_ranks, rank_relative_strength};
pub use scan::{
    build_flow_chain, build_price_provider, chunk_listings, ScanError, ScanReport, ScanSummary,
    Scanner, SymbolOutcome,
};
pub use sector::{rank_sectors, SectorRanking};
pub use synthetic::SyntheticProvider;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn scanner_is_send_sync() {
        assert_send::<Scanner>();
        assert_sync::<Scanner>();
    }

    #[test]
    fn records_are_send_sync() {
        assert_send::<ScanRecord>();
        assert_sync::<ScanRecord>();
        assert_send::<ScanSummary>();
        assert_send::<SectorRanking>();
    }
}
