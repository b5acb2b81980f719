//! REST market data client
//!
//! Fetches candle series from a time-series REST API and maps them into
//! ascending [`PricePoint`]s. Provider errors surface as
//! `UpstreamUnavailable`; the synthesizer degrades to
//! "signals unavailable" rather than failing a recommendation.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::traits::DataProvider;
use crate::common::errors::{EngineError, Result};
use crate::common::types::{validate_series, PricePoint, Timeframe};
use crate::config::types::MarketDataConfig;

/// Upper bound on a single candle request
const MAX_CANDLE_COUNT: usize = 5000;

/// Raw candle row as returned by the API (string-encoded numbers)
#[derive(Debug, Deserialize)]
struct CandleRow {
    datetime: String,
    open: String,
    high: String,
    low: String,
    close: String,
    #[serde(default)]
    volume: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    values: Vec<CandleRow>,
}

/// REST client for candle data
#[derive(Debug, Clone)]
pub struct HttpMarketDataClient {
    /// HTTP client
    client: Client,
    /// Base URL for the time-series API
    base_url: String,
    /// Optional API key sent as a query parameter
    api_key: Option<String>,
}

impl HttpMarketDataClient {
    /// Create a client from configuration
    pub fn new(config: &MarketDataConfig) -> Result<Self> {
        Self::with_timeout(
            &config.base_url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Url::parse(base_url)
            .map_err(|e| EngineError::Configuration(format!("invalid market data URL: {}", e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl DataProvider for HttpMarketDataClient {
    #[instrument(skip(self))]
    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<PricePoint>> {
        if count == 0 || count > MAX_CANDLE_COUNT {
            return Err(EngineError::InvalidInput(format!(
                "candle count must be in 1..={}, got {}",
                MAX_CANDLE_COUNT, count
            )));
        }

        let mut url = format!(
            "{}/time_series?symbol={}&interval={}&outputsize={}",
            self.base_url,
            symbol,
            timeframe.as_str(),
            count
        );
        if let Some(key) = &self.api_key {
            url.push_str(&format!("&apikey={}", key));
        }
        debug!("Fetching candles from: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::UpstreamUnavailable(format!(
                "market data API returned status {}: {}",
                status, body
            )));
        }

        let payload: TimeSeriesResponse = response.json().await?;
        let mut series = payload
            .values
            .into_iter()
            .map(parse_candle)
            .collect::<Result<Vec<_>>>()?;

        // Providers commonly return newest-first; normalize to ascending
        series.sort_by_key(|point| point.timestamp);
        validate_series(&series)
            .map_err(|e| EngineError::InvalidResponse(format!("bad candle series: {}", e)))?;
        Ok(series)
    }
}

fn parse_candle(row: CandleRow) -> Result<PricePoint> {
    let timestamp = parse_timestamp(&row.datetime)?;
    Ok(PricePoint::new(
        timestamp,
        parse_decimal("open", &row.open)?,
        parse_decimal("high", &row.high)?,
        parse_decimal("low", &row.low)?,
        parse_decimal("close", &row.close)?,
        row.volume
            .as_deref()
            .map(|v| parse_decimal("volume", v))
            .transpose()?
            .unwrap_or(Decimal::ZERO),
    ))
}

fn parse_timestamp(value: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    // Either RFC 3339 or the API's "YYYY-MM-DD HH:MM:SS" form
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&chrono::Utc));
    }
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| EngineError::InvalidResponse(format!("invalid datetime {}: {}", value, e)))
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value)
        .map_err(|e| EngineError::InvalidResponse(format!("invalid {} {}: {}", field, value, e)))
}
