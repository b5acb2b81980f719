//! LLM-backed sentiment source
//!
//! Talks to a chat-completions-style endpoint and normalizes the model's
//! reply into a [`SentimentEstimate`] via a strict line-oriented
//! `KEY: value` grammar. Replies missing a direction are rejected as
//! unparsable, which the synthesizer treats the same as an outage.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::traits::{SentimentEstimate, SentimentSource};
use crate::common::errors::{EngineError, Result};
use crate::common::types::TradeDirection;
use crate::config::types::SentimentConfig;

/// Chat request payload
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat response payload (only the fields we read)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// LLM-backed sentiment client
#[derive(Debug, Clone)]
pub struct LlmSentimentClient {
    /// HTTP client
    client: Client,
    /// Base URL of the chat-completions API
    base_url: String,
    /// Bearer token
    api_key: String,
    /// Model identifier
    model: String,
}

impl LlmSentimentClient {
    /// Create a client from configuration
    pub fn new(config: &SentimentConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| EngineError::Configuration("sentiment API key not set".to_string()))?;
        Self::with_timeout(
            &config.base_url,
            api_key,
            config.model.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(
        base_url: &str,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self> {
        Url::parse(base_url)
            .map_err(|e| EngineError::Configuration(format!("invalid sentiment URL: {}", e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    /// One round trip to the chat endpoint, returning the reply text
    #[instrument(skip(self, prompt))]
    async fn chat(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting sentiment from: {}", url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after_seconds = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(EngineError::RateLimit {
                message: "sentiment backend rate limited".to_string(),
                retry_after_seconds,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::UpstreamUnavailable(format!(
                "sentiment backend returned status {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| EngineError::InvalidResponse("empty choices in reply".to_string()))
    }
}

#[async_trait]
impl SentimentSource for LlmSentimentClient {
    #[instrument(skip(self))]
    async fn estimate(&self, symbol: &str) -> Result<SentimentEstimate> {
        let prompt = build_prompt(symbol);
        let reply = self.chat(&prompt).await?;
        parse_estimate(&reply)
    }

    fn provider_name(&self) -> &str {
        &self.model
    }
}

/// Prompt instructing the model to answer in the line grammar we parse
fn build_prompt(symbol: &str) -> String {
    format!(
        "You are a market analyst. Give a trade assessment for {symbol}.\n\
         Answer ONLY with these lines, one per line:\n\
         DIRECTION: BUY|SELL|NONE\n\
         CONFIDENCE: <0..1>\n\
         ENTRY: <price or NONE>\n\
         STOP: <price or NONE>\n\
         TARGET: <price or NONE>\n\
         SUMMARY: <one sentence>\n\
         FACTOR: <one supporting factor, repeat the line per factor>"
    )
}

/// Parse the model reply into an estimate
///
/// The grammar is line-oriented `KEY: value`. A reply without a DIRECTION
/// line is unparsable; malformed numeric fields degrade to absent values.
fn parse_estimate(reply: &str) -> Result<SentimentEstimate> {
    let mut direction = None;
    let mut confidence = None;
    let mut entry = None;
    let mut stop_loss = None;
    let mut take_profit = None;
    let mut factors = Vec::new();
    let mut summary = String::new();

    for line in reply.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_uppercase().as_str() {
            "DIRECTION" => {
                direction = match value.to_uppercase().as_str() {
                    "BUY" | "LONG" => Some(TradeDirection::Buy),
                    "SELL" | "SHORT" => Some(TradeDirection::Sell),
                    "NONE" | "NEUTRAL" | "HOLD" => Some(TradeDirection::None),
                    _ => None,
                };
            }
            "CONFIDENCE" => confidence = value.parse::<f64>().ok(),
            "ENTRY" => entry = parse_price(value),
            "STOP" => stop_loss = parse_price(value),
            "TARGET" => take_profit = parse_price(value),
            "SUMMARY" => summary = value.to_string(),
            "FACTOR" => {
                if !value.is_empty() {
                    factors.push(value.to_string());
                }
            }
            _ => {}
        }
    }

    let direction = direction.ok_or_else(|| {
        EngineError::UnparsableSentiment("reply contains no DIRECTION line".to_string())
    })?;

    Ok(SentimentEstimate {
        direction,
        confidence: confidence.unwrap_or(0.5).clamp(0.0, 1.0),
        entry,
        stop_loss,
        take_profit,
        factors,
        summary,
    })
}

fn parse_price(value: &str) -> Option<Decimal> {
    Decimal::from_str(value)
        .ok()
        .filter(|price| *price > Decimal::ZERO)
}
