//! Relative strength: each symbol's 3- and 6-month return ranked against the
//! rest of the evaluated set.

use std::collections::HashMap;

use bandscan_core::domain::{PriceSeries, RelativeStrength};

/// Trading days in three months.
pub const BARS_3M: usize = 63;
/// Trading days in six months.
pub const BARS_6M: usize = 126;

/// Percentile (0–100) of each value among the defined values.
///
/// A value's percentile is the share of defined values at or below it, so the
/// best performer gets 100 and ties share the higher rank. Undefined values
/// rank 0.
pub fn percentile_ranks(values: &[Option<f64>]) -> Vec<u8> {
    let mut defined: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    defined.sort_by(f64::total_cmp);
    let n = defined.len();

    values
        .iter()
        .map(|v| match v {
            Some(v) if v.is_finite() && n > 0 => {
                let at_or_below = defined.partition_point(|d| d <= v);
                ((at_or_below as f64 / n as f64) * 100.0).round() as u8
            }
            _ => 0,
        })
        .collect()
}

/// Rank every series' trailing 3- and 6-month returns, keyed by symbol.
pub fn rank_relative_strength<'a>(
    series: impl IntoIterator<Item = &'a PriceSeries>,
) -> HashMap<String, RelativeStrength> {
    let series: Vec<&PriceSeries> = series.into_iter().collect();
    let r3: Vec<Option<f64>> = series.iter().map(|s| s.trailing_return(BARS_3M)).collect();
    let r6: Vec<Option<f64>> = series.iter().map(|s| s.trailing_return(BARS_6M)).collect();
    let p3 = percentile_ranks(&r3);
    let p6 = percentile_ranks(&r6);

    series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            (
                s.symbol().to_string(),
                RelativeStrength::new(i64::from(p3[i]), i64::from(p6[i])),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandscan_core::domain::Bar;
    use chrono::NaiveDate;

    fn trending(code: &str, n: usize, daily: f64) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut close: f64 = 10_000.0;
        let bars = (0..n)
            .map(|i| {
                close *= 1.0 + daily;
                Bar {
                    date: base + chrono::Duration::days(i as i64),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1_000,
                }
            })
            .collect();
        PriceSeries::new(code, bars).unwrap()
    }

    #[test]
    fn percentiles_of_distinct_values() {
        let ranks = percentile_ranks(&[Some(0.1), Some(-0.2), Some(0.3), Some(0.0)]);
        assert_eq!(ranks, vec![75, 25, 100, 50]);
    }

    #[test]
    fn ties_share_the_higher_rank_and_missing_is_zero() {
        let ranks = percentile_ranks(&[Some(0.1), Some(0.1), None, Some(f64::NAN)]);
        assert_eq!(ranks, vec![100, 100, 0, 0]);
        assert!(percentile_ranks(&[]).is_empty());
    }

    #[test]
    fn ranks_by_trailing_returns() {
        let a = trending("A", 200, 0.002);
        let b = trending("B", 200, -0.001);
        let c = trending("C", 100, 0.01);
        let rs = rank_relative_strength([&a, &b, &c]);

        assert_eq!(rs["C"].rs_3m, 100);
        assert_eq!(rs["B"].rs_3m, 33);
        // C lacks six months of history
        assert_eq!(rs["C"].rs_6m, 0);
        assert_eq!(rs["A"].rs_6m, 100);
        assert_eq!(rs["B"].rs_6m, 50);
    }
}
