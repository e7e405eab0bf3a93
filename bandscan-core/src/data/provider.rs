//! Data provider traits and structured error types.
//!
//! Price history and investor flow come from external collaborators. The
//! traits here let the runner swap a CSV directory, an HTTP chart API or a
//! synthetic generator, and mock any of them in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{InvestorFlow, PriceSeries, SeriesError};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {code}")]
    SymbolNotFound { code: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid series for {code}: {source}")]
    InvalidSeries {
        code: String,
        #[source]
        source: SeriesError,
    },

    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Whether another attempt against the same source could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_) | DataError::RateLimited { .. } | DataError::Other(_)
        )
    }
}

/// Where a piece of data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    CsvDirectory,
    HttpChart,
    JsonFile,
    Synthetic,
}

/// Source of daily OHLCV history.
pub trait PriceHistoryProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Daily bars for `code` with dates in `[start, end]`, oldest first.
    fn fetch_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

/// Source of recent foreign/institutional net buying for a symbol.
pub trait InvestorFlowProvider: Send + Sync {
    fn name(&self) -> &str;

    fn fetch_flow(&self, code: &str) -> Result<InvestorFlow, DataError>;
}

impl<T: PriceHistoryProvider + ?Sized> PriceHistoryProvider for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        (**self).fetch_history(code, start, end)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

impl<T: InvestorFlowProvider + ?Sized> InvestorFlowProvider for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_flow(&self, code: &str) -> Result<InvestorFlow, DataError> {
        (**self).fetch_flow(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(DataError::NetworkUnreachable("timeout".into()).is_transient());
        assert!(DataError::RateLimited { retry_after_secs: 5 }.is_transient());
        assert!(!DataError::CircuitBreakerTripped.is_transient());
        assert!(!DataError::SymbolNotFound { code: "000000".into() }.is_transient());
    }

    #[test]
    fn error_messages_name_the_symbol() {
        let err = DataError::SymbolNotFound {
            code: "005930".into(),
        };
        assert_eq!(err.to_string(), "symbol not found: 005930");
    }
}
