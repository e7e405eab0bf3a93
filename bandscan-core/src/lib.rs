//! bandscan core: indicators, pattern signals, setup classification, risk and
//! composite scoring for a daily equity screener.
//!
//! The crate is organised leaves-first:
//! - Domain types (bars, price series, investor flow, relative strength, regime)
//! - Indicator engine (Bollinger bands, bandwidth rank, ADX, ATR, moving averages)
//! - Pattern detector producing a per-bar `SignalSet`
//! - Setup classifier, risk & stop calculator, composite scorer
//! - Strategy recommender for reports
//! - Data collaborator traits and file/HTTP providers
//!
//! [`evaluate()`] is the single per-symbol entry point. It holds no state across calls.

pub mod config;
pub mod data;
pub mod domain;
pub mod evaluate;
pub mod indicators;
pub mod risk;
pub mod scoring;
pub mod setup;
pub mod signals;
pub mod strategy;

pub use config::{ConfigError, ScanConfig};
pub use evaluate::{evaluate, evaluate_detailed, evaluate_in_regime, Evaluation, ScoreResult, SkipReason};
pub use setup::SetupTag;
