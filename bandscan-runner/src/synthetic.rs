//! Synthetic price history for offline runs.
//!
//! Each symbol gets a reproducible random walk seeded from the BLAKE3 hash of
//! its code. The data is clearly fake; scans on it only exercise the pipeline.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bandscan_core::data::{DataError, PriceHistoryProvider};
use bandscan_core::domain::{Bar, PriceSeries};

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    start_price: f64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self {
            start_price: 10_000.0,
        }
    }
}

impl SyntheticProvider {
    pub fn new(start_price: f64) -> Self {
        Self { start_price }
    }

    /// Weekday bars from `start` to `end`, identical for identical inputs.
    pub fn generate(&self, code: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
        let seed: [u8; 32] = *blake3::hash(code.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::new();
        let mut price = self.start_price;
        let mut current = start;

        while current <= end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += chrono::Duration::days(1);
                continue;
            }

            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = (price * (1.0 + daily_return)).max(1.0);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let mut volume = rng.gen_range(200_000..2_000_000u64);
            if rng.gen_bool(0.02) {
                volume *= 6;
            }

            bars.push(Bar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
            });

            price = close;
            current += chrono::Duration::days(1);
        }

        bars
    }
}

impl PriceHistoryProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let bars = self.generate(code, start, end);
        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                code: code.to_string(),
            });
        }
        PriceSeries::new(code, bars).map_err(|source| DataError::InvalidSeries {
            code: code.to_string(),
            source,
        })
    }
}
