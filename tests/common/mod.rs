//! Common test utilities and fixtures

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use trade_advisor::common::errors::{EngineError, Result};
use trade_advisor::common::types::{PricePoint, Timeframe, TradeDirection};
use trade_advisor::providers::{DataProvider, SentimentEstimate, SentimentSource};

/// A sentiment estimate matching the EURUSD walk-through scenario
pub fn eurusd_buy_estimate() -> SentimentEstimate {
    SentimentEstimate {
        direction: TradeDirection::Buy,
        confidence: 0.75,
        entry: Some(dec!(1.0925)),
        stop_loss: Some(dec!(1.0850)),
        take_profit: Some(dec!(1.1050)),
        factors: vec!["ECB hawkish tilt".to_string()],
        summary: "Momentum favors the euro".to_string(),
    }
}

/// Scripted sentiment source returning a fixed estimate and counting calls
pub struct ScriptedSentiment {
    estimate: SentimentEstimate,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSentiment {
    pub fn new(estimate: SentimentEstimate) -> Self {
        Self {
            estimate,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl SentimentSource for ScriptedSentiment {
    async fn estimate(&self, _symbol: &str) -> Result<SentimentEstimate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.estimate.clone())
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

/// Sentiment source that always fails as an upstream outage
#[derive(Default)]
pub struct FailingSentiment {
    calls: Arc<AtomicUsize>,
}

impl FailingSentiment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl SentimentSource for FailingSentiment {
    async fn estimate(&self, _symbol: &str) -> Result<SentimentEstimate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(EngineError::UpstreamUnavailable(
            "sentiment backend is down".to_string(),
        ))
    }

    fn provider_name(&self) -> &str {
        "failing"
    }
}

/// Sentiment source that never answers inside any sane deadline
pub struct HangingSentiment;

#[async_trait]
impl SentimentSource for HangingSentiment {
    async fn estimate(&self, _symbol: &str) -> Result<SentimentEstimate> {
        tokio::time::sleep(std::time::Duration::from_secs(600)).await;
        unreachable!("the synthesizer must time out first")
    }

    fn provider_name(&self) -> &str {
        "hanging"
    }
}

/// Data provider serving a fixed candle series
pub struct StaticCandles {
    series: Vec<PricePoint>,
}

impl StaticCandles {
    pub fn new(series: Vec<PricePoint>) -> Self {
        Self { series }
    }
}

#[async_trait]
impl DataProvider for StaticCandles {
    async fn candles(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<PricePoint>> {
        let start = self.series.len().saturating_sub(count);
        Ok(self.series[start..].to_vec())
    }
}

/// Fixed series origin so fixtures stay deterministic across tests
static SERIES_ORIGIN: Lazy<DateTime<Utc>> =
    Lazy::new(|| Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap());

/// Hourly candle series climbing from `start` by `step` per bar, ending at
/// the last close
pub fn rising_series(start: Decimal, step: Decimal, bars: usize) -> Vec<PricePoint> {
    let t0 = *SERIES_ORIGIN;
    (0..bars)
        .map(|i| {
            let close = start + step * Decimal::from(i as i64);
            PricePoint::new(
                t0 + Duration::hours(i as i64),
                close - step / dec!(2),
                close + step,
                close - step,
                close,
                dec!(1000),
            )
        })
        .collect()
}

/// Flat series ending exactly at `price`
pub fn flat_series(price: Decimal, bars: usize) -> Vec<PricePoint> {
    rising_series(price, Decimal::ZERO, bars)
        .into_iter()
        .map(|mut point| {
            point.open = price;
            point.high = price;
            point.low = price;
            point.close = price;
            point
        })
        .collect()
}

/// Sample API payloads for wiremock-backed tests
pub mod api_responses {
    /// Chat completion reply carrying a well-formed estimate
    pub fn chat_reply(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }
            ]
        })
    }

    /// Structured reply for the EURUSD buy scenario
    pub const EURUSD_REPLY: &str = "DIRECTION: BUY\n\
        CONFIDENCE: 0.75\n\
        ENTRY: 1.0925\n\
        STOP: 1.0850\n\
        TARGET: 1.1050\n\
        SUMMARY: Momentum favors the euro.\n\
        FACTOR: ECB hawkish tilt";

    /// Time-series payload with three ascending hourly candles
    pub fn time_series() -> serde_json::Value {
        serde_json::json!({
            "values": [
                {
                    "datetime": "2024-03-12 12:00:00",
                    "open": "1.0915", "high": "1.0930",
                    "low": "1.0905", "close": "1.0920", "volume": "900"
                },
                {
                    "datetime": "2024-03-12 13:00:00",
                    "open": "1.0920", "high": "1.0940",
                    "low": "1.0910", "close": "1.0925", "volume": "1100"
                },
                {
                    "datetime": "2024-03-12 11:00:00",
                    "open": "1.0900", "high": "1.0920",
                    "low": "1.0895", "close": "1.0915", "volume": "800"
                }
            ]
        })
    }
}
