//! Unified types used across the decision engine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::{EngineError, Result};

/// Asset class of a tradeable instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Forex,
    Crypto,
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetClass::Forex => write!(f, "forex"),
            AssetClass::Crypto => write!(f, "crypto"),
        }
    }
}

/// A tradeable instrument
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    /// Symbol, e.g. "EURUSD" or "BTCUSDT"
    pub symbol: String,
    /// Asset class (crypto instruments never receive session penalties)
    pub asset_class: AssetClass,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, asset_class: AssetClass) -> Self {
        Self {
            symbol: symbol.into(),
            asset_class,
        }
    }

    /// True for 24/7 markets
    pub fn is_crypto(&self) -> bool {
        self.asset_class == AssetClass::Crypto
    }
}

/// Keyword catalog used to classify symbols into asset classes
///
/// Injected at construction time rather than read from module-level globals,
/// so tests can substitute alternate tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentCatalog {
    /// Substrings identifying crypto symbols
    pub crypto_keywords: Vec<String>,
    /// Quote-currency suffixes identifying crypto symbols
    pub crypto_suffixes: Vec<String>,
}

impl Default for InstrumentCatalog {
    fn default() -> Self {
        Self {
            crypto_keywords: ["BTC", "ETH", "SOL", "XRP", "ADA", "DOGE", "LTC", "BNB"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            crypto_suffixes: ["USDT", "USDC", "BUSD"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl InstrumentCatalog {
    /// Classify a symbol into an instrument, defaulting to forex
    pub fn classify(&self, symbol: &str) -> Instrument {
        let upper = symbol.to_uppercase();
        let is_crypto = self.crypto_keywords.iter().any(|k| upper.contains(k.as_str()))
            || self.crypto_suffixes.iter().any(|s| upper.ends_with(s.as_str()));

        let asset_class = if is_crypto {
            AssetClass::Crypto
        } else {
            AssetClass::Forex
        };
        Instrument::new(upper, asset_class)
    }
}

/// A single OHLCV candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Candle open time
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl PricePoint {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Validate that a price series is strictly ascending by timestamp
/// with no duplicates
pub fn validate_series(series: &[PricePoint]) -> Result<()> {
    for pair in series.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(EngineError::InvalidInput(format!(
                "price series not strictly ascending at {}",
                pair[1].timestamp
            )));
        }
    }
    Ok(())
}

/// Analysis timeframe for a candle series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    /// Wire representation used by data providers
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    /// Duration of one candle at this timeframe
    pub fn duration(&self) -> chrono::Duration {
        match self {
            Timeframe::M1 => chrono::Duration::minutes(1),
            Timeframe::M5 => chrono::Duration::minutes(5),
            Timeframe::M15 => chrono::Duration::minutes(15),
            Timeframe::M30 => chrono::Duration::minutes(30),
            Timeframe::H1 => chrono::Duration::hours(1),
            Timeframe::H4 => chrono::Duration::hours(4),
            Timeframe::D1 => chrono::Duration::days(1),
        }
    }

    /// Parse the wire representation
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "30m" => Ok(Timeframe::M30),
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            other => Err(EngineError::InvalidInput(format!(
                "unknown timeframe: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recommended trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeDirection {
    Buy,
    Sell,
    None,
}

impl TradeDirection {
    /// True for Buy or Sell
    pub fn is_directional(&self) -> bool {
        !matches!(self, TradeDirection::None)
    }

    /// Numeric sign of the direction (-1, 0, 1)
    pub fn sign(&self) -> i32 {
        match self {
            TradeDirection::Buy => 1,
            TradeDirection::Sell => -1,
            TradeDirection::None => 0,
        }
    }
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "BUY"),
            TradeDirection::Sell => write!(f, "SELL"),
            TradeDirection::None => write!(f, "NONE"),
        }
    }
}

/// Order type classification for the recommended entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Enter at the current market price
    Market,
    /// Buy below the current price
    BuyLimit,
    /// Buy above the current price
    BuyStop,
    /// Sell above the current price
    SellLimit,
    /// Sell below the current price
    SellStop,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::BuyLimit => write!(f, "BUY_LIMIT"),
            OrderType::BuyStop => write!(f, "BUY_STOP"),
            OrderType::SellLimit => write!(f, "SELL_LIMIT"),
            OrderType::SellStop => write!(f, "SELL_STOP"),
        }
    }
}

/// Risk classification of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::VeryHigh => write!(f, "VERY_HIGH"),
        }
    }
}

/// Named trading session of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradingSession {
    Asian,
    London,
    NewYork,
    AsianLondonOverlap,
    LondonNewYorkOverlap,
    Closed,
}

impl std::fmt::Display for TradingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradingSession::Asian => write!(f, "Asian"),
            TradingSession::London => write!(f, "London"),
            TradingSession::NewYork => write!(f, "New York"),
            TradingSession::AsianLondonOverlap => write!(f, "Asian/London overlap"),
            TradingSession::LondonNewYorkOverlap => write!(f, "London/New York overlap"),
            TradingSession::Closed => write!(f, "Closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn candle(ts: i64, close: Decimal) -> PricePoint {
        PricePoint::new(
            Utc.timestamp_opt(ts, 0).unwrap(),
            close,
            close,
            close,
            close,
            dec!(100),
        )
    }

    #[test]
    fn test_catalog_classifies_crypto_by_keyword() {
        let catalog = InstrumentCatalog::default();
        assert_eq!(catalog.classify("BTCUSD").asset_class, AssetClass::Crypto);
        assert_eq!(catalog.classify("ethusdt").asset_class, AssetClass::Crypto);
    }

    #[test]
    fn test_catalog_defaults_to_forex() {
        let catalog = InstrumentCatalog::default();
        let instrument = catalog.classify("EURUSD");
        assert_eq!(instrument.asset_class, AssetClass::Forex);
        assert_eq!(instrument.symbol, "EURUSD");
    }

    #[test]
    fn test_validate_series_rejects_duplicates() {
        let series = vec![candle(100, dec!(1.10)), candle(100, dec!(1.11))];
        assert!(validate_series(&series).is_err());
    }

    #[test]
    fn test_validate_series_rejects_descending() {
        let series = vec![candle(200, dec!(1.10)), candle(100, dec!(1.11))];
        assert!(validate_series(&series).is_err());
    }

    #[test]
    fn test_validate_series_accepts_ascending() {
        let series = vec![candle(100, dec!(1.10)), candle(200, dec!(1.11))];
        assert!(validate_series(&series).is_ok());
    }

    #[test]
    fn test_timeframe_round_trip() {
        assert_eq!(Timeframe::parse("4h").unwrap(), Timeframe::H4);
        assert!(Timeframe::parse("7h").is_err());
        assert_eq!(Timeframe::H1.to_string(), "1h");
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(TradeDirection::Buy.sign(), 1);
        assert_eq!(TradeDirection::Sell.sign(), -1);
        assert_eq!(TradeDirection::None.sign(), 0);
        assert!(!TradeDirection::None.is_directional());
    }
}
