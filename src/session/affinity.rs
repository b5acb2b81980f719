//! Instrument/session affinity tables
//!
//! Explicit immutable configuration data injected into the oracle at
//! construction time, so tests can substitute alternate tables.

use serde::{Deserialize, Serialize};

use crate::common::types::{Instrument, TradingSession};

/// A single keyword rule mapping symbols to a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffinityRule {
    /// Substring matched against the uppercase symbol
    pub keyword: String,
    /// Session associated with matching instruments
    pub session: TradingSession,
}

impl AffinityRule {
    pub fn new(keyword: impl Into<String>, session: TradingSession) -> Self {
        Self {
            keyword: keyword.into(),
            session,
        }
    }

    fn matches(&self, symbol: &str) -> bool {
        symbol.contains(self.keyword.as_str())
    }
}

/// Session affinity table for the oracle
///
/// `recommended` resolves the session an instrument trades best in;
/// `boosts` grants a +1 liquidity bonus (capped at 5) when the current
/// session matches the instrument's affinity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAffinityTable {
    pub recommended: Vec<AffinityRule>,
    pub boosts: Vec<AffinityRule>,
}

impl Default for SessionAffinityTable {
    fn default() -> Self {
        Self {
            recommended: vec![
                AffinityRule::new("JPY", TradingSession::Asian),
                AffinityRule::new("AUD", TradingSession::Asian),
                AffinityRule::new("NZD", TradingSession::Asian),
                AffinityRule::new("CAD", TradingSession::NewYork),
                AffinityRule::new("GBP", TradingSession::London),
                AffinityRule::new("EUR", TradingSession::LondonNewYorkOverlap),
                AffinityRule::new("USD", TradingSession::LondonNewYorkOverlap),
            ],
            boosts: vec![
                AffinityRule::new("JPY", TradingSession::Asian),
                AffinityRule::new("AUD", TradingSession::Asian),
                AffinityRule::new("NZD", TradingSession::Asian),
                AffinityRule::new("CAD", TradingSession::NewYork),
                AffinityRule::new("EUR", TradingSession::London),
                AffinityRule::new("GBP", TradingSession::London),
                AffinityRule::new("USD", TradingSession::NewYork),
            ],
        }
    }
}

impl SessionAffinityTable {
    /// Recommended session for an instrument, defaulting to the
    /// London/New York overlap when unmapped
    pub fn recommended_for(&self, instrument: &Instrument) -> TradingSession {
        self.recommended
            .iter()
            .find(|rule| rule.matches(&instrument.symbol))
            .map(|rule| rule.session)
            .unwrap_or(TradingSession::LondonNewYorkOverlap)
    }

    /// Whether the instrument earns a liquidity boost during `current`
    ///
    /// Overlap sessions inherit the boosts of their constituents, so a JPY
    /// cross boosted in Asian also boosts the Asian/London overlap.
    pub fn boost_applies(&self, instrument: &Instrument, current: TradingSession) -> bool {
        self.boosts
            .iter()
            .filter(|rule| rule.matches(&instrument.symbol))
            .any(|rule| session_contains(current, rule.session))
    }
}

/// Whether `current` is, or overlaps with, `target`
fn session_contains(current: TradingSession, target: TradingSession) -> bool {
    if current == target {
        return true;
    }
    match current {
        TradingSession::AsianLondonOverlap => {
            matches!(target, TradingSession::Asian | TradingSession::London)
        }
        TradingSession::LondonNewYorkOverlap => {
            matches!(target, TradingSession::London | TradingSession::NewYork)
        }
        _ => false,
    }
}
