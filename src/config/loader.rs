//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::{AppConfig, SentimentConfig};
use crate::common::errors::{EngineError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with ADVISOR_)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    // Add default config file if it exists
    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    // Add environment variables with ADVISOR_ prefix
    builder = builder.add_source(
        Environment::with_prefix("ADVISOR")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| EngineError::Configuration(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| EngineError::Configuration(e.to_string()))
}

/// Load configuration from environment variables only
pub fn load_from_env() -> Result<AppConfig> {
    // Try to load from .env file
    dotenvy::dotenv().ok();

    let sentiment = SentimentConfig {
        api_key: std::env::var("SENTIMENT_API_KEY").ok(),
        base_url: std::env::var("SENTIMENT_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
        model: std::env::var("SENTIMENT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        timeout_seconds: std::env::var("SENTIMENT_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300),
    };

    Ok(AppConfig {
        sentiment,
        market_data: None,
        engine: Default::default(),
        settings: Default::default(),
        instruments: Default::default(),
        sessions: Default::default(),
    })
}
