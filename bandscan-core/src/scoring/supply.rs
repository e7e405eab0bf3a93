//! Supply/demand sub-score from investor flow. No flow scores zero.

use crate::config::ScoringConfig;
use crate::domain::InvestorFlow;

/// Foreign consecutive-buy tiers, highest first: (minimum days, points).
const FOREIGN_STREAK_TIERS: [(u32, u32); 3] = [(5, 8), (3, 5), (1, 2)];
const INST_NET_BUY: u32 = 4;
const FOREIGN_NET_BUY: u32 = 3;

pub fn supply_score(flow: Option<&InvestorFlow>, weights: &ScoringConfig) -> u32 {
    let Some(flow) = flow else {
        return 0;
    };

    let mut score = FOREIGN_STREAK_TIERS
        .iter()
        .find(|(days, _)| flow.foreign_consecutive_buy_days >= *days)
        .map(|(_, points)| *points)
        .unwrap_or(0);
    if flow.inst_net_buy_5d > 0.0 {
        score += INST_NET_BUY;
    }
    if flow.foreign_net_buy_5d > 0.0 {
        score += FOREIGN_NET_BUY;
    }
    score.min(weights.supply_weight)
}
