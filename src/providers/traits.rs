//! Trait definitions for external collaborators
//!
//! The synthesizer only depends on these contracts; concrete HTTP clients
//! live beside them and tests substitute mocks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use crate::common::errors::Result;
use crate::common::types::{PricePoint, Timeframe, TradeDirection};

/// Directional market view supplied by a sentiment source
///
/// Price fields are optional — a source that cannot commit to levels leaves
/// them absent rather than reporting zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentEstimate {
    /// Primary direction of the view
    pub direction: TradeDirection,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Suggested best entry price
    pub entry: Option<Decimal>,
    /// Suggested stop-loss price
    pub stop_loss: Option<Decimal>,
    /// Suggested take-profit price
    pub take_profit: Option<Decimal>,
    /// Supporting factors, in reading order
    pub factors: Vec<String>,
    /// One-paragraph narrative summary
    pub summary: String,
}

/// A news headline attached to a recommendation as enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

/// Sentiment source (LLM-backed or heuristic)
///
/// May fail or return unparsable content; the synthesizer recovers with a
/// degraded recommendation rather than propagating the error.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SentimentSource: Send + Sync {
    /// Produce a directional estimate for a symbol
    async fn estimate(&self, symbol: &str) -> Result<SentimentEstimate>;

    /// Stable provider identity, used as part of the cache key
    fn provider_name(&self) -> &str;
}

/// Market data provider for candle series
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetch up to `count` candles in strictly ascending timestamp order
    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<PricePoint>>;
}

/// Optional news enrichment provider
///
/// Purely additive — failures never block a recommendation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Recent headlines for a symbol
    async fn news_for(&self, symbol: &str, count: usize) -> Result<Vec<NewsArticle>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_sentiment_source() {
        let mut mock = MockSentimentSource::new();
        mock.expect_estimate().returning(|_| {
            Ok(SentimentEstimate {
                direction: TradeDirection::Buy,
                confidence: 0.8,
                entry: Some(dec!(1.10)),
                stop_loss: None,
                take_profit: None,
                factors: vec![],
                summary: String::new(),
            })
        });
        mock.expect_provider_name().return_const("mock".to_string());

        let estimate = mock.estimate("EURUSD").await.unwrap();
        assert_eq!(estimate.direction, TradeDirection::Buy);
        assert_eq!(mock.provider_name(), "mock");
    }

    #[tokio::test]
    async fn test_mock_data_provider_failure() {
        use crate::common::errors::EngineError;

        let mut mock = MockDataProvider::new();
        mock.expect_candles().returning(|_, _, _| {
            Err(EngineError::UpstreamUnavailable("down".to_string()))
        });

        let result = mock.candles("EURUSD", Timeframe::H1, 10).await;
        assert!(result.is_err());
    }
}
