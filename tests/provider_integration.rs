//! Integration tests for the HTTP providers
//!
//! The chat-completions and time-series endpoints are mocked with wiremock;
//! no real network access is involved.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::api_responses;
use trade_advisor::common::types::{InstrumentCatalog, Timeframe, TradeDirection};
use trade_advisor::engine::TradeAdvisor;
use trade_advisor::providers::{
    DataProvider, HttpMarketDataClient, LlmSentimentClient, SentimentSource,
};
use trade_advisor::session::SessionOracle;
use trade_advisor::EngineError;

fn sentiment_client(server: &MockServer) -> LlmSentimentClient {
    LlmSentimentClient::with_timeout(
        &server.uri(),
        "test-key".to_string(),
        "test-model".to_string(),
        Duration::from_secs(5),
    )
    .expect("failed to build sentiment client")
}

fn market_data_client(server: &MockServer) -> HttpMarketDataClient {
    HttpMarketDataClient::with_timeout(&server.uri(), None, Duration::from_secs(5))
        .expect("failed to build market data client")
}

// ============================================================================
// Sentiment Provider
// ============================================================================

#[tokio::test]
async fn test_sentiment_estimate_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({ "model": "test-model" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(api_responses::chat_reply(api_responses::EURUSD_REPLY)),
        )
        .mount(&server)
        .await;

    let client = sentiment_client(&server);
    let estimate = client.estimate("EURUSD").await.unwrap();

    assert_eq!(estimate.direction, TradeDirection::Buy);
    assert_eq!(estimate.confidence, 0.75);
    assert_eq!(estimate.entry, Some(dec!(1.0925)));
    assert_eq!(estimate.stop_loss, Some(dec!(1.0850)));
    assert_eq!(estimate.take_profit, Some(dec!(1.1050)));
}

#[tokio::test]
async fn test_sentiment_server_error_is_upstream_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = sentiment_client(&server);
    let result = client.estimate("EURUSD").await;

    match result {
        Err(error) => assert!(error.is_recoverable(), "unexpected error: {}", error),
        Ok(_) => panic!("expected an error"),
    }
}

#[tokio::test]
async fn test_sentiment_prose_without_fields_is_unparsable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(api_responses::chat_reply(
            "The market looks uncertain today, hard to say.",
        )))
        .mount(&server)
        .await;

    let client = sentiment_client(&server);
    let result = client.estimate("EURUSD").await;

    assert!(matches!(result, Err(EngineError::UnparsableSentiment(_))));
}

#[tokio::test]
async fn test_sentiment_rate_limit_maps_to_rate_limit_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&server)
        .await;

    let client = sentiment_client(&server);
    let result = client.estimate("EURUSD").await;

    match result {
        Err(EngineError::RateLimit {
            retry_after_seconds,
            ..
        }) => assert_eq!(retry_after_seconds, Some(30)),
        other => panic!("expected rate limit error, got {:?}", other),
    }
}

// ============================================================================
// Market Data Provider
// ============================================================================

#[tokio::test]
async fn test_candles_are_normalized_ascending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/time_series"))
        .respond_with(ResponseTemplate::new(200).set_body_json(api_responses::time_series()))
        .mount(&server)
        .await;

    let client = market_data_client(&server);
    let series = client.candles("EURUSD", Timeframe::H1, 10).await.unwrap();

    assert_eq!(series.len(), 3);
    // The payload is unordered; the client sorts ascending
    assert!(series.windows(2).all(|pair| pair[0].timestamp < pair[1].timestamp));
    assert_eq!(series.last().unwrap().close, dec!(1.0925));
}

#[tokio::test]
async fn test_candle_count_validated() {
    let server = MockServer::start().await;
    let client = market_data_client(&server);

    let result = client.candles("EURUSD", Timeframe::H1, 0).await;
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));

    let result = client.candles("EURUSD", Timeframe::H1, 100_000).await;
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));
}

#[tokio::test]
async fn test_candle_server_error_is_upstream_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/time_series"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = market_data_client(&server);
    let result = client.candles("EURUSD", Timeframe::H1, 10).await;

    assert!(matches!(result, Err(EngineError::UpstreamUnavailable(_))));
}

// ============================================================================
// End-to-End over HTTP
// ============================================================================

#[test_log::test(tokio::test)]
async fn test_recommendation_through_mocked_providers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(api_responses::chat_reply(api_responses::EURUSD_REPLY)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/time_series"))
        .respond_with(ResponseTemplate::new(200).set_body_json(api_responses::time_series()))
        .mount(&server)
        .await;

    let advisor = TradeAdvisor::new(
        Arc::new(sentiment_client(&server)),
        SessionOracle::default(),
        InstrumentCatalog::default(),
        Default::default(),
    )
    .with_data_provider(Arc::new(market_data_client(&server)));

    let recommendation = advisor.recommend("EURUSD", None, &[]).await.unwrap();

    assert_eq!(recommendation.direction, TradeDirection::Buy);
    // Current price comes from the last candle close
    assert_eq!(recommendation.current_price, dec!(1.0925));
    assert!((recommendation.risk_reward_ratio - dec!(1.6667)).abs() < dec!(0.001));
    assert!(recommendation.is_trade_recommended);
    assert_eq!(recommendation.provider, "test-model");
}