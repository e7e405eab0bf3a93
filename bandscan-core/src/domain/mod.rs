//! Domain types for bandscan

pub mod bar;
pub mod flow;
pub mod series;

pub use bar::Bar;
pub use flow::{InvestorFlow, MarketRegime, RelativeStrength};
pub use series::{PriceSeries, SeriesError};

/// Symbol code type alias (e.g. "005930").
pub type Symbol = String;
