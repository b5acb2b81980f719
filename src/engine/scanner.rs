//! Batch "market movers" scan
//!
//! Applies the session oracle and signal classifier as a pre-filter, then
//! fans out into the synthesizer with bounded concurrency so upstream rate
//! limits on the sentiment source are respected.

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::synthesizer::TradeAdvisor;
use super::types::{AccountParams, Recommendation};
use crate::common::types::TradeDirection;

/// Minimum session liquidity for a non-crypto symbol to survive the
/// pre-filter
const MIN_SCAN_LIQUIDITY: u8 = 3;

/// Outcome of scanning one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanOutcome {
    /// Survived the pre-filter and produced a recommendation
    Recommended(Box<Recommendation>),
    /// Dropped before the sentiment source was called
    FilteredOut { reason: String },
    /// The recommendation call itself failed
    Failed { error: String },
}

/// Per-symbol scan report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub symbol: String,
    pub outcome: ScanOutcome,
}

/// Bounded-concurrency scanner over the synthesizer
pub struct MarketScanner<'a> {
    advisor: &'a TradeAdvisor,
}

impl<'a> MarketScanner<'a> {
    pub fn new(advisor: &'a TradeAdvisor) -> Self {
        Self { advisor }
    }

    /// Scan a list of symbols
    ///
    /// Symbols in weak sessions or without directional EMA evidence are
    /// filtered out before any sentiment call; the survivors fan out with
    /// at most the configured number of concurrent recommendations.
    /// Per-symbol failures never abort the batch.
    #[instrument(skip(self, symbols, account, profit_targets), fields(count = symbols.len()))]
    pub async fn scan(
        &self,
        symbols: &[String],
        account: Option<AccountParams>,
        profit_targets: &[Decimal],
    ) -> Vec<ScanReport> {
        let concurrency = self.advisor.scan_concurrency();
        info!(
            "scanning {} symbols with concurrency {}",
            symbols.len(),
            concurrency
        );

        stream::iter(symbols)
            .map(|symbol| self.scan_one(symbol, account, profit_targets))
            .buffer_unordered(concurrency)
            .collect()
            .await
    }

    async fn scan_one(
        &self,
        symbol: &str,
        account: Option<AccountParams>,
        profit_targets: &[Decimal],
    ) -> ScanReport {
        let instrument = self.advisor.classify_symbol(symbol);
        let session = self.advisor.session_info(&instrument, Utc::now());

        if !instrument.is_crypto() && session.liquidity_level < MIN_SCAN_LIQUIDITY {
            return ScanReport {
                symbol: instrument.symbol,
                outcome: ScanOutcome::FilteredOut {
                    reason: format!(
                        "liquidity {}/5 in the {} session",
                        session.liquidity_level, session.current_session
                    ),
                },
            };
        }

        // A computed flat bias vetoes the symbol; signals being unavailable
        // does not — the filter exists to save sentiment calls, not to
        // require a data provider.
        if self.advisor.technical_bias(&instrument).await == Some(TradeDirection::None) {
            return ScanReport {
                symbol: instrument.symbol,
                outcome: ScanOutcome::FilteredOut {
                    reason: "no directional EMA evidence".to_string(),
                },
            };
        }

        match self
            .advisor
            .recommend(&instrument.symbol, account, profit_targets)
            .await
        {
            Ok(recommendation) => ScanReport {
                symbol: instrument.symbol,
                outcome: ScanOutcome::Recommended(Box::new(recommendation)),
            },
            Err(error) => ScanReport {
                symbol: instrument.symbol,
                outcome: ScanOutcome::Failed {
                    error: error.to_string(),
                },
            },
        }
    }
}
