//! Recommendation synthesizer, cache and batch scanner
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ASYNC (collaborators)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SentimentSource ── direction, levels, confidence           │
//! │  DataProvider ───── candles for EMA classification          │
//! │  NewsProvider ───── optional factor enrichment              │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SYNC (pure computation)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SessionOracle ──── session + liquidity context             │
//! │  SignalClassifier ─ EMA state transitions                   │
//! │  RiskCalculator ─── leverage-aware sizing                   │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  TradeAdvisor::recommend() → validated Recommendation       │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  RecommendationCache (TTL, single-flight)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod scanner;
pub mod synthesizer;
pub mod types;

pub use cache::{CacheKey, RecommendationCache};
pub use scanner::{MarketScanner, ScanOutcome, ScanReport};
pub use synthesizer::TradeAdvisor;
pub use types::{
    AccountParams, Recommendation, ScalpPlan, NEUTRAL_CONFIDENCE, SENTIMENT_ERROR_FACTOR,
};
