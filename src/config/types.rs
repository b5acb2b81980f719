//! Configuration types

use serde::{Deserialize, Serialize};

use crate::common::types::InstrumentCatalog;
use crate::session::affinity::SessionAffinityTable;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Sentiment provider configuration
    #[serde(default)]
    pub sentiment: SentimentConfig,
    /// Market data provider configuration (optional; signals are skipped
    /// when absent)
    #[serde(default)]
    pub market_data: Option<MarketDataConfig>,
    /// Engine tunables
    #[serde(default)]
    pub engine: EngineSettings,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
    /// Symbol classification keyword catalog
    #[serde(default)]
    pub instruments: InstrumentCatalog,
    /// Instrument/session affinity table for the session oracle
    #[serde(default)]
    pub sessions: SessionAffinityTable,
}

/// Sentiment provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    /// API key for the LLM backend
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL for the chat-completions endpoint
    #[serde(default = "default_sentiment_url")]
    pub base_url: String,
    /// Model identifier requested from the backend
    #[serde(default = "default_sentiment_model")]
    pub model: String,
    /// Request timeout in seconds (model-backed providers can be slow)
    #[serde(default = "default_sentiment_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_sentiment_url(),
            model: default_sentiment_model(),
            timeout_seconds: default_sentiment_timeout(),
        }
    }
}

fn default_sentiment_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_sentiment_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_sentiment_timeout() -> u64 {
    300
}

/// Market data provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfig {
    /// API key for authenticated requests
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL for the candle REST API
    #[serde(default = "default_market_data_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_market_data_timeout")]
    pub timeout_seconds: u64,
}

fn default_market_data_url() -> String {
    "https://api.twelvedata.com".to_string()
}

fn default_market_data_timeout() -> u64 {
    30
}

/// Engine tunables for the recommendation synthesizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Recommendation cache TTL in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    /// Entry tolerance as a percent of current price, used for the
    /// safe-entry check and order-type classification
    #[serde(default = "default_entry_tolerance")]
    pub entry_tolerance_percent: f64,
    /// Maximum concurrent recommendations during a batch scan
    #[serde(default = "default_scan_concurrency")]
    pub max_scan_concurrency: usize,
    /// Number of candles requested for signal classification
    #[serde(default = "default_candle_count")]
    pub candle_count: usize,
    /// Primary analysis timeframe (wire format, e.g. "1h")
    #[serde(default = "default_primary_timeframe")]
    pub primary_timeframe: String,
    /// Short timeframe for the fast-scalp filter (wire format, e.g. "5m")
    #[serde(default = "default_scalp_timeframe")]
    pub scalp_timeframe: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: default_cache_ttl(),
            entry_tolerance_percent: default_entry_tolerance(),
            max_scan_concurrency: default_scan_concurrency(),
            candle_count: default_candle_count(),
            primary_timeframe: default_primary_timeframe(),
            scalp_timeframe: default_scalp_timeframe(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_entry_tolerance() -> f64 {
    0.1
}

fn default_scan_concurrency() -> usize {
    4
}

fn default_candle_count() -> usize {
    100
}

fn default_primary_timeframe() -> String {
    "1h".to_string()
}

fn default_scalp_timeframe() -> String {
    "5m".to_string()
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// News provider request timeout in seconds
    #[serde(default = "default_news_timeout")]
    pub news_timeout_seconds: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            news_timeout_seconds: default_news_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_news_timeout() -> u64 {
    30
}
