//! TradeAdvisor - Main Entry Point
//!
//! CLI for producing a single recommendation or scanning a list of symbols.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use trade_advisor::config::loader;
use trade_advisor::engine::{AccountParams, MarketScanner, TradeAdvisor};
use trade_advisor::providers::{HttpMarketDataClient, LlmSentimentClient};
use trade_advisor::session::SessionOracle;

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Symbol to analyze, e.g. EURUSD
    #[arg(long)]
    symbol: Option<String>,

    /// Comma-separated symbols for a batch scan
    #[arg(long)]
    scan: Option<String>,

    /// Account balance for position sizing
    #[arg(long)]
    balance: Option<Decimal>,

    /// Account leverage for position sizing
    #[arg(long, default_value = "100")]
    leverage: Decimal,

    /// Comma-separated profit targets in account currency
    #[arg(long)]
    targets: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = loader::load_config(Some(&args.config))
        .or_else(|_| loader::load_from_env())
        .context("failed to load configuration")?;

    let sentiment = Arc::new(
        LlmSentimentClient::new(&config.sentiment).context("sentiment provider setup failed")?,
    );
    let mut advisor = TradeAdvisor::new(
        sentiment,
        SessionOracle::new(config.sessions.clone()),
        config.instruments.clone(),
        config.engine.clone(),
    )
    .with_sentiment_timeout(std::time::Duration::from_secs(
        config.sentiment.timeout_seconds,
    ));

    if let Some(market_data) = &config.market_data {
        let data = HttpMarketDataClient::new(market_data)
            .context("market data provider setup failed")?;
        advisor = advisor.with_data_provider(Arc::new(data));
    }

    let account = args
        .balance
        .map(|balance| AccountParams::new(balance, args.leverage));
    let targets = parse_targets(args.targets.as_deref())?;

    if let Some(symbols) = &args.scan {
        let symbols: Vec<String> = symbols
            .split(',')
            .map(|symbol| symbol.trim().to_string())
            .filter(|symbol| !symbol.is_empty())
            .collect();
        info!("scanning {} symbols", symbols.len());

        let scanner = MarketScanner::new(&advisor);
        let reports = scanner.scan(&symbols, account, &targets).await;
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    let symbol = args
        .symbol
        .context("either --symbol or --scan is required")?;
    let recommendation = advisor.recommend(&symbol, account, &targets).await?;
    println!("{}", serde_json::to_string_pretty(&recommendation)?);

    Ok(())
}

fn parse_targets(raw: Option<&str>) -> Result<Vec<Decimal>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(|target| {
            Decimal::from_str(target.trim())
                .with_context(|| format!("invalid profit target: {}", target))
        })
        .collect()
}
