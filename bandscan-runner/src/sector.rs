//! Sector ranking by the average 3-month return of each sector's largest listings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use bandscan_core::data::Listing;

use crate::config::OutputConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorRanking {
    pub sector: String,
    /// Percent.
    pub avg_return_3m: f64,
    /// Listings in the sector, not only those averaged.
    pub stock_count: usize,
}

/// Rank sectors, best first.
///
/// `listings` must be ordered by market cap, largest first; only the first
/// `sector_universe_top_n` are considered. Within each sector of at least
/// `sector_min_members` listings, the first `sector_top_members` with a known
/// 3-month return are averaged. Sectors with no known return are dropped.
pub fn rank_sectors(
    listings: &[Listing],
    returns_3m: &HashMap<String, f64>,
    config: &OutputConfig,
) -> Vec<SectorRanking> {
    let considered = &listings[..listings.len().min(config.sector_universe_top_n)];

    // first-seen order keeps ties deterministic
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Listing>> = HashMap::new();
    for listing in considered.iter().filter(|l| !l.sector.is_empty()) {
        let members = groups.entry(listing.sector.as_str()).or_default();
        if members.is_empty() {
            order.push(listing.sector.as_str());
        }
        members.push(listing);
    }

    let mut rankings: Vec<SectorRanking> = order
        .into_iter()
        .filter_map(|sector| {
            let members = &groups[sector];
            if members.len() < config.sector_min_members {
                return None;
            }
            let returns: Vec<f64> = members
                .iter()
                .take(config.sector_top_members)
                .filter_map(|l| returns_3m.get(&l.code).copied())
                .filter(|r| r.is_finite())
                .collect();
            if returns.is_empty() {
                return None;
            }
            Some(SectorRanking {
                sector: sector.to_string(),
                avg_return_3m: returns.iter().sum::<f64>() / returns.len() as f64 * 100.0,
                stock_count: members.len(),
            })
        })
        .collect();

    rankings.sort_by(|a, b| b.avg_return_3m.total_cmp(&a.avg_return_3m));
    rankings
}
