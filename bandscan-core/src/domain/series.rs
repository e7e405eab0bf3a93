//! PriceSeries: an ordered, date-indexed run of bars for one symbol.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Bar;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("duplicate bar date {date} at index {index}")]
    DuplicateDate { date: NaiveDate, index: usize },

    #[error("bar dates out of order at index {index}: {previous} then {date}")]
    OutOfOrder {
        previous: NaiveDate,
        date: NaiveDate,
        index: usize,
    },
}

/// Immutable daily price history for a single symbol.
///
/// Dates are strictly increasing; construction rejects duplicates and
/// out-of-order bars rather than silently re-sorting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (index, pair) in bars.windows(2).enumerate() {
            let (previous, date) = (pair[0].date, pair[1].date);
            if date == previous {
                return Err(SeriesError::DuplicateDate {
                    date,
                    index: index + 1,
                });
            }
            if date < previous {
                return Err(SeriesError::OutOfOrder {
                    previous,
                    date,
                    index: index + 1,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Build a series from bars in arbitrary order: sorts by date and keeps the
    /// first bar seen for each date. Used by providers whose upstream data may
    /// repeat or reorder rows.
    pub fn from_unordered(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Prefix of the series ending at `end` (exclusive). Used for causality checks
    /// and for evaluating as of an earlier date.
    pub fn truncated(&self, end: usize) -> Self {
        Self {
            symbol: self.symbol.clone(),
            bars: self.bars[..end.min(self.bars.len())].to_vec(),
        }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }

    /// Simple return over the last `bars_back` bars, or `None` if history is too short.
    pub fn trailing_return(&self, bars_back: usize) -> Option<f64> {
        let n = self.bars.len();
        if bars_back == 0 || n <= bars_back {
            return None;
        }
        let start = self.bars[n - 1 - bars_back].close;
        let end = self.bars[n - 1].close;
        if start > 0.0 && start.is_finite() && end.is_finite() {
            Some(end / start - 1.0)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100,
        }
    }

    #[test]
    fn accepts_increasing_dates() {
        let s = PriceSeries::new("005930", vec![bar(1, 10.0), bar(4, 11.0)]).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.symbol(), "005930");
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::new("X", vec![bar(1, 10.0), bar(1, 11.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::DuplicateDate { index: 1, .. }));
    }

    #[test]
    fn rejects_out_of_order_dates() {
        let err = PriceSeries::new("X", vec![bar(5, 10.0), bar(2, 11.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::OutOfOrder { index: 1, .. }));
    }

    #[test]
    fn from_unordered_sorts_and_dedups() {
        let s = PriceSeries::from_unordered("X", vec![bar(5, 12.0), bar(2, 10.0), bar(5, 13.0)]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.bars()[0].close, 10.0);
        assert_eq!(s.bars()[1].close, 12.0);
    }

    #[test]
    fn trailing_return_uses_close() {
        let s = PriceSeries::new("X", vec![bar(1, 10.0), bar(2, 11.0), bar(3, 12.0)]).unwrap();
        let r = s.trailing_return(2).unwrap();
        assert!((r - 0.2).abs() < 1e-12);
        assert!(s.trailing_return(3).is_none());
    }

    #[test]
    fn truncated_keeps_prefix() {
        let s = PriceSeries::new("X", vec![bar(1, 10.0), bar(2, 11.0), bar(3, 12.0)]).unwrap();
        let t = s.truncated(2);
        assert_eq!(t.len(), 2);
        assert_eq!(t.last().unwrap().close, 11.0);
    }
}
