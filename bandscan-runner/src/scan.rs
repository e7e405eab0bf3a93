//! Scan orchestration: fetch a shard's histories, rank relative strength,
//! evaluate every symbol in parallel and collect records plus a summary.
//!
//! A symbol never fails the scan. Fetch errors become [`SymbolOutcome::Failed`],
//! evaluation skips become [`SymbolOutcome::Skipped`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use bandscan_core::data::{
    CircuitBreaker, CsvDirectoryProvider, DataError, FlowFetchChain, HttpChartConfig,
    HttpChartProvider, JsonFlowProvider, Listing, PriceHistoryProvider, Universe, UniverseError,
};
use bandscan_core::domain::{MarketRegime, PriceSeries, RelativeStrength};
use bandscan_core::{evaluate_detailed, evaluate_in_regime, Evaluation, ScoreResult, SkipReason};

use crate::config::{DataConfig, PriceSource, RunnerConfig};
use crate::record::ScanRecord;
use crate::relative_strength::{rank_relative_strength, BARS_3M};
use crate::sector::{rank_sectors, SectorRanking};
use crate::synthetic::SyntheticProvider;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("universe error: {0}")]
    Universe(#[from] UniverseError),

    #[error("data source error: {0}")]
    Data(#[from] DataError),

    #[error("failed to build scan thread pool: {0}")]
    ThreadPool(String),
}

/// What happened to one symbol.
#[derive(Debug, Clone)]
pub enum SymbolOutcome {
    Scored { listing: Listing, result: ScoreResult },
    Skipped { code: String, reason: SkipReason },
    Failed { code: String, error: String },
}

/// Counts and diagnostics for one scanned chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub scan_date: NaiveDate,
    pub chunk: usize,
    pub config_fingerprint: String,
    pub regime: MarketRegime,
    pub requested: usize,
    pub scored: usize,
    /// Scored records at or above the minimum total score.
    pub kept: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Skip counts keyed by [`SkipReason::label`].
    pub skip_reasons: BTreeMap<String, usize>,
    /// `(code, error)` for every failed fetch.
    pub failures: Vec<(String, String)>,
    /// Symbols scored with a zero-filled investor flow.
    pub zero_filled_flows: Vec<String>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Kept records, highest total score first.
    pub records: Vec<ScanRecord>,
    pub outcomes: Vec<SymbolOutcome>,
    pub summary: ScanSummary,
    /// Trailing 3-month return of every fetched series, for sector ranking.
    pub returns_3m: HashMap<String, f64>,
}

/// Build the configured price provider.
pub fn build_price_provider(
    data: &DataConfig,
) -> Result<Box<dyn PriceHistoryProvider>, ScanError> {
    let provider: Box<dyn PriceHistoryProvider> = match data.price_source {
        PriceSource::Csv => Box::new(CsvDirectoryProvider::new(&data.csv_dir)),
        PriceSource::Synthetic => Box::new(SyntheticProvider::default()),
        PriceSource::Http => {
            let mut config = HttpChartConfig {
                symbol_suffix: data.http_symbol_suffix.clone(),
                timeout: Duration::from_secs(data.http_timeout_secs),
                max_retries: data.http_retries,
                ..HttpChartConfig::default()
            };
            if let Some(url) = &data.http_base_url {
                config.base_url = url.clone();
            }
            Box::new(HttpChartProvider::new(
                config,
                Arc::new(CircuitBreaker::for_scan()),
            )?)
        }
    };
    Ok(provider)
}

/// Build the investor-flow chain, or `None` when no flow file is configured.
pub fn build_flow_chain(data: &DataConfig) -> Result<Option<FlowFetchChain>, ScanError> {
    let Some(primary) = &data.flow_file else {
        return Ok(None);
    };
    let mut chain = FlowFetchChain::new(Box::new(JsonFlowProvider::from_file(primary)?))
        .with_base_delay(Duration::from_millis(data.flow_retry_base_ms));
    if let Some(secondary) = &data.secondary_flow_file {
        chain = chain.with_secondary(Box::new(JsonFlowProvider::from_file(secondary)?));
    }
    Ok(Some(chain))
}

/// Listings of the configured 1-based chunk: filtered, ordered by cap, cut to
/// `top_n`, then sliced.
pub fn chunk_listings(universe: &Universe, config: &RunnerConfig) -> Result<Vec<Listing>, ScanError> {
    let mut filtered = universe.filtered(&config.scan.universe);
    if let Some(top_n) = config.shard.top_n {
        filtered.stocks.truncate(top_n);
    }
    let index = config.shard.chunk.saturating_sub(1);
    Ok(filtered.shard(config.shard.chunk_size, index)?.to_vec())
}

pub struct Scanner {
    config: RunnerConfig,
    prices: Box<dyn PriceHistoryProvider>,
    flows: Option<FlowFetchChain>,
}

impl Scanner {
    pub fn new(
        config: RunnerConfig,
        prices: Box<dyn PriceHistoryProvider>,
        flows: Option<FlowFetchChain>,
    ) -> Self {
        Self {
            config,
            prices,
            flows,
        }
    }

    /// Scanner with providers built from `config.data`.
    pub fn from_config(config: RunnerConfig) -> Result<Self, ScanError> {
        let prices = build_price_provider(&config.data)?;
        let flows = build_flow_chain(&config.data)?;
        Ok(Self::new(config, prices, flows))
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn history_start(&self, scan_date: NaiveDate) -> NaiveDate {
        scan_date - chrono::Duration::days(self.config.data.history_days)
    }

    /// Regime from the benchmark, `Normal` when unset or unavailable.
    pub fn market_regime(&self, scan_date: NaiveDate) -> MarketRegime {
        let Some(code) = &self.config.data.benchmark else {
            return MarketRegime::Normal;
        };
        match self
            .prices
            .fetch_history(code, self.history_start(scan_date), scan_date)
        {
            Ok(series) => MarketRegime::from_benchmark(&series),
            Err(e) => {
                warn!(benchmark = %code, error = %e, "benchmark unavailable, assuming normal regime");
                MarketRegime::Normal
            }
        }
    }

    /// Fetch, resolve flow and evaluate one symbol in full detail.
    ///
    /// The outer error is a fetch failure; the inner one an evaluation skip.
    pub fn evaluate_one(
        &self,
        code: &str,
        scan_date: NaiveDate,
        rs: RelativeStrength,
    ) -> Result<Result<Evaluation, SkipReason>, DataError> {
        let series = self
            .prices
            .fetch_history(code, self.history_start(scan_date), scan_date)?;
        let flow = self.flows.as_ref().map(|chain| chain.resolve(code).flow);
        let regime = self.market_regime(scan_date);
        Ok(evaluate_detailed(&series, &self.config.scan, flow.as_ref(), rs, regime))
    }

    fn fetch_all(
        &self,
        listings: &[Listing],
        scan_date: NaiveDate,
    ) -> Vec<(Listing, Result<PriceSeries, DataError>)> {
        let start = self.history_start(scan_date);
        listings
            .par_iter()
            .map(|listing| {
                let fetched = self.prices.fetch_history(&listing.code, start, scan_date);
                (listing.clone(), fetched)
            })
            .collect()
    }

    /// Scan `listings` as chunk `chunk` on `scan_date`.
    pub fn scan(
        &self,
        listings: &[Listing],
        scan_date: NaiveDate,
        chunk: usize,
    ) -> Result<ScanReport, ScanError> {
        match self.config.shard.threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ScanError::ThreadPool(e.to_string()))?;
                Ok(pool.install(|| self.scan_inner(listings, scan_date, chunk)))
            }
            None => Ok(self.scan_inner(listings, scan_date, chunk)),
        }
    }

    fn scan_inner(&self, listings: &[Listing], scan_date: NaiveDate, chunk: usize) -> ScanReport {
        let started = Instant::now();
        let regime = self.market_regime(scan_date);
        info!(
            chunk,
            symbols = listings.len(),
            provider = self.prices.name(),
            ?regime,
            "scanning chunk"
        );

        let mut outcomes = Vec::with_capacity(listings.len());
        let mut fetched: Vec<(Listing, PriceSeries)> = Vec::with_capacity(listings.len());
        for (listing, result) in self.fetch_all(listings, scan_date) {
            match result {
                Ok(series) => fetched.push((listing, series)),
                Err(e) => {
                    warn!(code = %listing.code, error = %e, "price history unavailable");
                    outcomes.push(SymbolOutcome::Failed {
                        code: listing.code,
                        error: e.to_string(),
                    });
                }
            }
        }

        let rs = rank_relative_strength(fetched.iter().map(|(_, s)| s));
        let returns_3m: HashMap<String, f64> = fetched
            .iter()
            .filter_map(|(l, s)| s.trailing_return(BARS_3M).map(|r| (l.code.clone(), r)))
            .collect();

        let evaluated: Vec<(SymbolOutcome, bool)> = fetched
            .into_par_iter()
            .map(|(listing, series)| {
                let resolution = self.flows.as_ref().map(|chain| chain.resolve(&listing.code));
                let zero_filled = resolution.as_ref().is_some_and(|r| r.is_zero_filled());
                let strength = rs
                    .get(&listing.code)
                    .copied()
                    .unwrap_or_default();
                let outcome = match evaluate_in_regime(
                    &series,
                    &self.config.scan,
                    resolution.as_ref().map(|r| &r.flow),
                    strength,
                    regime,
                ) {
                    Ok(result) => SymbolOutcome::Scored { listing, result },
                    Err(reason) => {
                        debug!(code = %listing.code, reason = %reason, "skipped");
                        SymbolOutcome::Skipped {
                            code: listing.code,
                            reason,
                        }
                    }
                };
                (outcome, zero_filled)
            })
            .collect();

        let mut zero_filled_flows = Vec::new();
        for (outcome, zero_filled) in evaluated {
            if zero_filled {
                if let SymbolOutcome::Scored { listing, .. } = &outcome {
                    zero_filled_flows.push(listing.code.clone());
                }
            }
            outcomes.push(outcome);
        }

        let min_score = self.config.output.min_total_score;
        let mut records: Vec<ScanRecord> = outcomes
            .iter()
            .filter_map(|o| match o {
                SymbolOutcome::Scored { listing, result } if result.total_score >= min_score => {
                    Some(ScanRecord::new(listing, result, scan_date, chunk))
                }
                _ => None,
            })
            .collect();
        records.sort_by(|a, b| b.total_score.cmp(&a.total_score));

        let summary = self.summarize(
            &outcomes,
            records.len(),
            zero_filled_flows,
            scan_date,
            chunk,
            regime,
            started,
        );
        info!(
            chunk,
            scored = summary.scored,
            kept = summary.kept,
            skipped = summary.skipped,
            failed = summary.failed,
            elapsed_ms = summary.elapsed_ms,
            "chunk complete"
        );

        ScanReport {
            records,
            outcomes,
            summary,
            returns_3m,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn summarize(
        &self,
        outcomes: &[SymbolOutcome],
        kept: usize,
        zero_filled_flows: Vec<String>,
        scan_date: NaiveDate,
        chunk: usize,
        regime: MarketRegime,
        started: Instant,
    ) -> ScanSummary {
        let mut skip_reasons: BTreeMap<String, usize> = BTreeMap::new();
        let mut failures = Vec::new();
        let mut scored = 0;
        for outcome in outcomes {
            match outcome {
                SymbolOutcome::Scored { .. } => scored += 1,
                SymbolOutcome::Skipped { reason, .. } => {
                    *skip_reasons.entry(reason.label().to_string()).or_default() += 1;
                }
                SymbolOutcome::Failed { code, error } => failures.push((code.clone(), error.clone())),
            }
        }
        let skipped = skip_reasons.values().sum();

        ScanSummary {
            scan_date,
            chunk,
            config_fingerprint: self.config.scan.fingerprint(),
            regime,
            requested: outcomes.len(),
            scored,
            kept,
            skipped,
            failed: failures.len(),
            skip_reasons,
            failures,
            zero_filled_flows,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Rank sectors over the largest listings of `ordered` (market-cap order).
    ///
    /// Returns already known from a scan are reused; the rest are fetched.
    pub fn sector_rankings(
        &self,
        ordered: &[Listing],
        known_returns: &HashMap<String, f64>,
        scan_date: NaiveDate,
    ) -> Vec<SectorRanking> {
        let output = &self.config.output;
        let considered = &ordered[..ordered.len().min(output.sector_universe_top_n)];
        let missing: Vec<Listing> = considered
            .iter()
            .filter(|l| !l.sector.is_empty() && !known_returns.contains_key(&l.code))
            .cloned()
            .collect();

        let mut returns = known_returns.clone();
        for (listing, result) in self.fetch_all(&missing, scan_date) {
            match result {
                Ok(series) => {
                    if let Some(r) = series.trailing_return(BARS_3M) {
                        returns.insert(listing.code, r);
                    }
                }
                Err(e) => debug!(code = %listing.code, error = %e, "no history for sector ranking"),
            }
        }

        rank_sectors(considered, &returns, output)
    }
}
