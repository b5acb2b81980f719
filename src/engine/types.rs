//! Recommendation types and the pure merge/validation math
//!
//! The numeric guards live here as free functions so unit tests exercise
//! them without any async machinery.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::types::{OrderType, RiskLevel, TradeDirection};
use crate::risk::PositionSizing;
use crate::session::SessionWindow;

/// Confidence reported on degraded recommendations
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Factor attached to degraded recommendations
pub const SENTIMENT_ERROR_FACTOR: &str = "Error fetching sentiment data";

/// Account parameters supplied by the caller for position sizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountParams {
    pub balance: Decimal,
    pub leverage: Decimal,
}

impl AccountParams {
    pub fn new(balance: Decimal, leverage: Decimal) -> Self {
        Self { balance, leverage }
    }
}

/// Fast-scalp sub-recommendation
///
/// Attached when the short-timeframe EMA state agrees with the primary
/// direction; tighter levels, short validity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalpPlan {
    pub direction: TradeDirection,
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub valid_until: DateTime<Utc>,
}

/// A bounded, internally-consistent trade recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: String,
    /// Sentiment provider that produced the base estimate
    pub provider: String,
    pub direction: TradeDirection,
    pub current_price: Decimal,
    /// Best entry price (the sentiment estimate's level, never overridden)
    pub best_entry: Decimal,
    pub order_type: OrderType,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub risk_level: RiskLevel,
    /// Reward distance over risk distance; exactly 0 whenever the price
    /// geometry is inconsistent
    pub risk_reward_ratio: Decimal,
    pub is_trade_recommended: bool,
    /// Session context, recomputed live on cache hits
    pub session: SessionWindow,
    /// Present only for non-crypto instruments in a weaker-than-recommended
    /// session
    pub session_warning: Option<String>,
    /// Estimated seconds until price reaches the best entry
    pub seconds_to_entry: Option<i64>,
    pub generated_at: DateTime<Utc>,
    /// Strictly after `generated_at`
    pub valid_until: DateTime<Utc>,
    /// Whether entering at the current price is acceptable
    pub safe_entry: bool,
    pub safe_entry_reason: String,
    pub sizing: Option<PositionSizing>,
    pub factors: Vec<String>,
    pub scalp: Option<ScalpPlan>,
}

/// Risk-reward ratio under the consistency invariant
///
/// Computed only when stop and target sit on the economically correct side
/// of the current price for the direction; anything else — missing levels,
/// zero price, inverted geometry, zero risk distance — yields exactly 0.
pub fn risk_reward_ratio(
    direction: TradeDirection,
    current: Decimal,
    stop_loss: Option<Decimal>,
    take_profit: Option<Decimal>,
) -> Decimal {
    if current <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let (Some(stop), Some(target)) = (stop_loss, take_profit) else {
        return Decimal::ZERO;
    };
    match direction {
        TradeDirection::Buy if stop < current && target > current => {
            (target - current) / (current - stop)
        }
        TradeDirection::Sell if stop > current && target < current => {
            (current - target) / (stop - current)
        }
        _ => Decimal::ZERO,
    }
}

/// Order-type classification for an entry relative to the current price
pub fn classify_order_type(
    direction: TradeDirection,
    current: Decimal,
    entry: Decimal,
    tolerance: Decimal,
) -> OrderType {
    if (entry - current).abs() <= tolerance {
        return OrderType::Market;
    }
    match direction {
        TradeDirection::Buy if entry < current => OrderType::BuyLimit,
        TradeDirection::Buy => OrderType::BuyStop,
        TradeDirection::Sell if entry > current => OrderType::SellLimit,
        TradeDirection::Sell => OrderType::SellStop,
        TradeDirection::None => OrderType::Market,
    }
}

/// Safe-entry check: current price within tolerance of the best entry and
/// on the favorable side of the stop
pub fn safe_entry_check(
    direction: TradeDirection,
    current: Decimal,
    entry: Decimal,
    stop_loss: Option<Decimal>,
    tolerance: Decimal,
) -> (bool, String) {
    if !direction.is_directional() {
        return (false, "no trade direction".to_string());
    }
    if (entry - current).abs() > tolerance {
        return (
            false,
            format!(
                "current price {} is away from best entry {}",
                current, entry
            ),
        );
    }
    if let Some(stop) = stop_loss {
        let favorable = match direction {
            TradeDirection::Buy => current > stop,
            TradeDirection::Sell => current < stop,
            TradeDirection::None => false,
        };
        if !favorable {
            return (
                false,
                format!("current price {} is beyond the stop at {}", current, stop),
            );
        }
    }
    (true, "price is at the entry zone".to_string())
}

/// Risk classification from the stop distance as a percent of price
///
/// No stop or no direction classifies as High — unknown risk is not low
/// risk.
pub fn classify_risk(
    direction: TradeDirection,
    current: Decimal,
    stop_loss: Option<Decimal>,
) -> RiskLevel {
    if !direction.is_directional() || current <= Decimal::ZERO {
        return RiskLevel::High;
    }
    let Some(stop) = stop_loss else {
        return RiskLevel::High;
    };
    let distance_percent = (current - stop).abs() / current * dec!(100);
    if distance_percent < dec!(0.5) {
        RiskLevel::Low
    } else if distance_percent < dec!(1) {
        RiskLevel::Medium
    } else if distance_percent < dec!(2) {
        RiskLevel::High
    } else {
        RiskLevel::VeryHigh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_risk_reward_for_consistent_buy() {
        // (1.1050 - 1.0925) / (1.0925 - 1.0850) ≈ 1.67
        let ratio = risk_reward_ratio(
            TradeDirection::Buy,
            dec!(1.0925),
            Some(dec!(1.0850)),
            Some(dec!(1.1050)),
        );
        assert!((ratio - dec!(1.6667)).abs() < dec!(0.001));
    }

    #[test]
    fn test_risk_reward_for_consistent_sell() {
        let ratio = risk_reward_ratio(
            TradeDirection::Sell,
            dec!(1.1000),
            Some(dec!(1.1050)),
            Some(dec!(1.0900)),
        );
        assert_eq!(ratio, dec!(2));
    }

    #[test]
    fn test_risk_reward_zero_when_stop_equals_current() {
        let ratio = risk_reward_ratio(
            TradeDirection::Buy,
            dec!(1.1000),
            Some(dec!(1.1000)),
            Some(dec!(1.1100)),
        );
        assert_eq!(ratio, Decimal::ZERO);
    }

    #[test]
    fn test_risk_reward_zero_when_current_is_zero() {
        let ratio = risk_reward_ratio(
            TradeDirection::Buy,
            Decimal::ZERO,
            Some(dec!(1.0)),
            Some(dec!(1.2)),
        );
        assert_eq!(ratio, Decimal::ZERO);
    }

    #[test]
    fn test_risk_reward_zero_for_inverted_geometry() {
        // Buy with the target below the current price
        let ratio = risk_reward_ratio(
            TradeDirection::Buy,
            dec!(1.1000),
            Some(dec!(1.0900)),
            Some(dec!(1.0950)),
        );
        assert_eq!(ratio, Decimal::ZERO);

        // Sell with the stop below the current price
        let ratio = risk_reward_ratio(
            TradeDirection::Sell,
            dec!(1.1000),
            Some(dec!(1.0900)),
            Some(dec!(1.0800)),
        );
        assert_eq!(ratio, Decimal::ZERO);
    }

    #[test]
    fn test_risk_reward_zero_without_levels() {
        let ratio = risk_reward_ratio(TradeDirection::Buy, dec!(1.1), None, Some(dec!(1.2)));
        assert_eq!(ratio, Decimal::ZERO);
        let ratio = risk_reward_ratio(TradeDirection::None, dec!(1.1), Some(dec!(1.0)), Some(dec!(1.2)));
        assert_eq!(ratio, Decimal::ZERO);
    }

    #[test]
    fn test_order_type_classification() {
        let tol = dec!(0.001);
        assert_eq!(
            classify_order_type(TradeDirection::Buy, dec!(1.1000), dec!(1.1005), tol),
            OrderType::Market
        );
        assert_eq!(
            classify_order_type(TradeDirection::Buy, dec!(1.1000), dec!(1.0900), tol),
            OrderType::BuyLimit
        );
        assert_eq!(
            classify_order_type(TradeDirection::Buy, dec!(1.1000), dec!(1.1100), tol),
            OrderType::BuyStop
        );
        assert_eq!(
            classify_order_type(TradeDirection::Sell, dec!(1.1000), dec!(1.1100), tol),
            OrderType::SellLimit
        );
        assert_eq!(
            classify_order_type(TradeDirection::Sell, dec!(1.1000), dec!(1.0900), tol),
            OrderType::SellStop
        );
    }

    #[test]
    fn test_safe_entry_at_entry_zone() {
        let (safe, _) = safe_entry_check(
            TradeDirection::Buy,
            dec!(1.0925),
            dec!(1.0925),
            Some(dec!(1.0850)),
            dec!(0.0011),
        );
        assert!(safe);
    }

    #[test]
    fn test_safe_entry_rejects_price_beyond_stop() {
        let (safe, reason) = safe_entry_check(
            TradeDirection::Buy,
            dec!(1.0840),
            dec!(1.0841),
            Some(dec!(1.0850)),
            dec!(0.01),
        );
        assert!(!safe);
        assert!(reason.contains("stop"));
    }

    #[test]
    fn test_safe_entry_rejects_distant_price() {
        let (safe, _) = safe_entry_check(
            TradeDirection::Buy,
            dec!(1.1000),
            dec!(1.0900),
            Some(dec!(1.0850)),
            dec!(0.0011),
        );
        assert!(!safe);
    }

    #[test]
    fn test_risk_level_tiers() {
        let current = dec!(100);
        assert_eq!(
            classify_risk(TradeDirection::Buy, current, Some(dec!(99.8))),
            RiskLevel::Low
        );
        assert_eq!(
            classify_risk(TradeDirection::Buy, current, Some(dec!(99.2))),
            RiskLevel::Medium
        );
        assert_eq!(
            classify_risk(TradeDirection::Buy, current, Some(dec!(98.5))),
            RiskLevel::High
        );
        assert_eq!(
            classify_risk(TradeDirection::Buy, current, Some(dec!(95))),
            RiskLevel::VeryHigh
        );
        assert_eq!(classify_risk(TradeDirection::Buy, current, None), RiskLevel::High);
        assert_eq!(
            classify_risk(TradeDirection::None, current, Some(dec!(99.8))),
            RiskLevel::High
        );
    }
}
