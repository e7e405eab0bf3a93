//! Price history read from a directory of per-symbol CSV files (`{dir}/{code}.csv`).
//!
//! Accepts either lower-case (`date,open,...`) or capitalised (`Date,Open,...`)
//! headers. Volume may be written as a float; it is truncated to whole shares.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, PriceHistoryProvider};
use crate::domain::{Bar, PriceSeries};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume")]
    volume: f64,
}

impl From<CsvRow> for Bar {
    fn from(row: CsvRow) -> Self {
        Bar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: if row.volume.is_finite() && row.volume > 0.0 {
                row.volume as u64
            } else {
                0
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvDirectoryProvider {
    dir: PathBuf,
}

impl CsvDirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, code: &str) -> PathBuf {
        self.dir.join(format!("{code}.csv"))
    }

    /// Parse bars from any CSV reader. Rows outside `[start, end]` are dropped.
    pub fn read_bars<R: std::io::Read>(
        reader: R,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut bars = Vec::new();
        for row in rdr.deserialize::<CsvRow>() {
            let row = row.map_err(|e| DataError::ResponseFormatChanged(e.to_string()))?;
            if row.date >= start && row.date <= end {
                bars.push(Bar::from(row));
            }
        }
        Ok(bars)
    }
}

impl PriceHistoryProvider for CsvDirectoryProvider {
    fn name(&self) -> &str {
        "csv_directory"
    }

    fn fetch_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let path = self.path_for(code);
        let file = match std::fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::SymbolNotFound {
                    code: code.to_string(),
                })
            }
            Err(e) => {
                return Err(DataError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };
        let bars = Self::read_bars(file, start, end)?;
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

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
