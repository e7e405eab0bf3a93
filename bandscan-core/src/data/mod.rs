//! Data collaborators: price history, investor flow and the stock universe.

pub mod circuit_breaker;
pub mod csv_dir;
pub mod flow;
pub mod http;
pub mod provider;
pub mod universe;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_dir::CsvDirectoryProvider;
pub use flow::{FlowFetchChain, FlowResolution, FlowSource, JsonFlowProvider};
pub use http::{HttpChartConfig, HttpChartProvider};
pub use provider::{DataError, DataSource, InvestorFlowProvider, PriceHistoryProvider};
pub use universe::{Listing, Universe, UniverseError};
