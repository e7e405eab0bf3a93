//! Investor-flow providers and the primary → secondary → zero-filled fetch chain.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::http::linear_backoff;
use super::provider::{DataError, InvestorFlowProvider};
use crate::domain::InvestorFlow;

pub const PRIMARY_ATTEMPTS: u32 = 3;

/// Flow snapshot loaded from a JSON object keyed by symbol code:
///
/// ```json
/// { "005930": { "foreign_consecutive_buy_days": 3,
///               "foreign_net_buy_5d": 1.2e10, "inst_net_buy_5d": -4.0e9 } }
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonFlowProvider {
    flows: HashMap<String, InvestorFlow>,
}

impl JsonFlowProvider {
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path).map_err(|e| DataError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, DataError> {
        let flows = serde_json::from_str(content)
            .map_err(|e| DataError::ResponseFormatChanged(format!("flow JSON: {e}")))?;
        Ok(Self { flows })
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

impl InvestorFlowProvider for JsonFlowProvider {
    fn name(&self) -> &str {
        "json_flow"
    }

    fn fetch_flow(&self, code: &str) -> Result<InvestorFlow, DataError> {
        self.flows
            .get(code)
            .copied()
            .ok_or_else(|| DataError::SymbolNotFound {
                code: code.to_string(),
            })
    }
}

/// Which tier of the chain produced the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowSource {
    Primary,
    Secondary,
    /// Every source failed; the flow is [`InvestorFlow::zero`].
    ZeroFilled,
}

#[derive(Debug, Clone)]
pub struct FlowResolution {
    pub flow: InvestorFlow,
    pub source: FlowSource,
    /// One message per failed attempt, oldest first.
    pub failures: Vec<String>,
}

impl FlowResolution {
    pub fn is_zero_filled(&self) -> bool {
        self.source == FlowSource::ZeroFilled
    }
}

/// Up to [`PRIMARY_ATTEMPTS`] tries at the primary source with linear backoff,
/// one try at the secondary, then the zero-filled sentinel. Never fails.
pub struct FlowFetchChain {
    primary: Box<dyn InvestorFlowProvider>,
    secondary: Option<Box<dyn InvestorFlowProvider>>,
    attempts: u32,
    base_delay: Duration,
}

impl FlowFetchChain {
    pub fn new(primary: Box<dyn InvestorFlowProvider>) -> Self {
        Self {
            primary,
            secondary: None,
            attempts: PRIMARY_ATTEMPTS,
            base_delay: Duration::from_millis(500),
        }
    }

    pub fn with_secondary(mut self, secondary: Box<dyn InvestorFlowProvider>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn resolve(&self, code: &str) -> FlowResolution {
        let mut failures = Vec::new();

        for attempt in 1..=self.attempts {
            match self.primary.fetch_flow(code) {
                Ok(flow) => {
                    return FlowResolution {
                        flow,
                        source: FlowSource::Primary,
                        failures,
                    }
                }
                Err(e) => {
                    debug!(code, attempt, provider = self.primary.name(), error = %e, "flow fetch failed");
                    let retry = e.is_transient() && attempt < self.attempts;
                    failures.push(format!("{}: {e}", self.primary.name()));
                    if !retry {
                        break;
                    }
                    std::thread::sleep(linear_backoff(self.base_delay, attempt));
                }
            }
        }

        if let Some(secondary) = &self.secondary {
            match secondary.fetch_flow(code) {
                Ok(flow) => {
                    return FlowResolution {
                        flow,
                        source: FlowSource::Secondary,
                        failures,
                    }
                }
                Err(e) => failures.push(format!("{}: {e}", secondary.name())),
            }
        }

        warn!(code, failures = failures.len(), "investor flow unavailable, zero-filling");
        FlowResolution {
            flow: InvestorFlow::zero(),
            source: FlowSource::ZeroFilled,
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Fails `fail_first` times with a transient error, then succeeds.
    struct Flaky {
        calls: Arc<AtomicU32>,
        fail_first: u32,
        flow: InvestorFlow,
    }

    impl InvestorFlowProvider for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn fetch_flow(&self, _code: &str) -> Result<InvestorFlow, DataError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(DataError::NetworkUnreachable("timeout".into()))
            } else {
                Ok(self.flow)
            }
        }
    }

    fn flaky(fail_first: u32, days: u32) -> (Box<Flaky>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = Flaky {
            calls: Arc::clone(&calls),
            fail_first,
            flow: InvestorFlow {
                foreign_consecutive_buy_days: days,
                ..Default::default()
            },
        };
        (Box::new(provider), calls)
    }

    #[test]
    fn primary_succeeds_after_retries() {
        let (primary, calls) = flaky(2, 4);
        let chain = FlowFetchChain::new(primary).with_base_delay(Duration::ZERO);
        let res = chain.resolve("005930");
        assert_eq!(res.source, FlowSource::Primary);
        assert_eq!(res.flow.foreign_consecutive_buy_days, 4);
        assert_eq!(res.failures.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn falls_back_to_secondary() {
        let (primary, primary_calls) = flaky(u32::MAX, 4);
        let (secondary, _) = flaky(0, 7);
        let chain = FlowFetchChain::new(primary)
            .with_secondary(secondary)
            .with_base_delay(Duration::ZERO);
        let res = chain.resolve("005930");
        assert_eq!(res.source, FlowSource::Secondary);
        assert_eq!(res.flow.foreign_consecutive_buy_days, 7);
        assert_eq!(primary_calls.load(Ordering::SeqCst), PRIMARY_ATTEMPTS);
    }

    #[test]
    fn zero_fills_when_everything_fails() {
        let (primary, _) = flaky(u32::MAX, 4);
        let (secondary, _) = flaky(u32::MAX, 7);
        let chain = FlowFetchChain::new(primary)
            .with_secondary(secondary)
            .with_base_delay(Duration::ZERO);
        let res = chain.resolve("005930");
        assert!(res.is_zero_filled());
        assert_eq!(res.flow, InvestorFlow::zero());
        assert_eq!(res.failures.len(), 4);
    }

    #[test]
    fn permanent_error_skips_retries() {
        let provider = JsonFlowProvider::from_json("{}").unwrap();
        let chain = FlowFetchChain::new(Box::new(provider)).with_base_delay(Duration::ZERO);
        let res = chain.resolve("005930");
        assert!(res.is_zero_filled());
        assert_eq!(res.failures.len(), 1);
    }

    #[test]
    fn json_provider_reads_by_code() {
        let provider = JsonFlowProvider::from_json(
            r#"{"005930": {"foreign_consecutive_buy_days": 3,
                "foreign_net_buy_5d": 1.5e10, "inst_net_buy_5d": -2.0e9}}"#,
        )
        .unwrap();
        assert_eq!(provider.len(), 1);
        let flow = provider.fetch_flow("005930").unwrap();
        assert_eq!(flow.foreign_consecutive_buy_days, 3);
        assert!(flow.inst_net_buy_5d < 0.0);
        assert!(provider.fetch_flow("000660").is_err());
    }

    #[test]
    fn json_provider_rejects_bad_json() {
        assert!(matches!(
            JsonFlowProvider::from_json("[1, 2]"),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }
}
