//! Property tests for the partial-output merge and percentile ranking.

use std::collections::HashSet;

use chrono::NaiveDate;
use proptest::prelude::*;

use bandscan_runner::{merge_records, percentile_ranks, ScanRecord};

fn record(code: u8, total: u32, chunk: usize) -> ScanRecord {
    ScanRecord {
        code: format!("{code:06}"),
        name: String::new(),
        market: "KOSPI".into(),
        sector: String::new(),
        close: 10_000.0,
        stop: 9_500.0,
        risk_pct: 5.0,
        trend_score: 0,
        pattern_score: 0,
        volume_score: 0,
        supply_score: 0,
        risk_score: 0,
        total_score: total,
        setup: "-".into(),
        ma20: 0.0,
        ma60: 0.0,
        bb_upper: 0.0,
        scan_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        chunk,
    }
}

fn arb_parts() -> impl Strategy<Value = Vec<Vec<ScanRecord>>> {
    prop::collection::vec(
        prop::collection::vec((0u8..30, 0u32..=100), 0..20),
        1..5,
    )
    .prop_map(|parts| {
        parts
            .into_iter()
            .enumerate()
            .map(|(chunk, rows)| {
                rows.into_iter()
                    .map(|(code, total)| record(code, total, chunk + 1))
                    .collect()
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn merge_is_one_row_per_code_sorted(parts in arb_parts()) {
        let distinct: HashSet<String> = parts.iter().flatten().map(|r| r.code.clone()).collect();
        let merged = merge_records(parts.clone());

        prop_assert_eq!(merged.len(), distinct.len());
        prop_assert!(merged.windows(2).all(|w| w[0].total_score >= w[1].total_score));

        // each kept row is the first occurrence in input order
        for row in &merged {
            let first = parts.iter().flatten().find(|r| r.code == row.code).unwrap();
            prop_assert_eq!(row, first);
        }
    }

    #[test]
    fn percentiles_are_bounded_and_monotone(values in prop::collection::vec(prop::option::of(-1.0f64..1.0), 0..50)) {
        let ranks = percentile_ranks(&values);
        prop_assert_eq!(ranks.len(), values.len());
        for (i, a) in values.iter().enumerate() {
            prop_assert!(ranks[i] <= 100);
            for (j, b) in values.iter().enumerate() {
                if let (Some(a), Some(b)) = (a, b) {
                    if a < b {
                        prop_assert!(ranks[i] <= ranks[j]);
                    }
                }
            }
        }
    }
}
