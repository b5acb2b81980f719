//! Leverage-aware position sizing

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{EngineError, Result};
use crate::common::types::{AssetClass, TradeDirection};

/// Broker lot size per asset class, in base currency units
fn lot_size(asset_class: AssetClass) -> Decimal {
    match asset_class {
        AssetClass::Forex => dec!(100000),
        AssetClass::Crypto => dec!(1),
    }
}

/// Sizing row for one requested profit target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSizing {
    /// Price movement needed to realize the target at max position size,
    /// signed by direction
    pub price_move_needed: Decimal,
    /// The same movement as a percent of current price
    pub price_move_percent: Decimal,
    /// Position size realizing the target at the actual stop distance,
    /// capped at max position size; absent without a stop
    pub required_size: Option<Decimal>,
    /// `required_size` in broker lots; absent without a stop
    pub required_lot: Option<Decimal>,
    /// Account currency at risk if the stop is hit; absent without a stop
    pub risk_amount: Option<Decimal>,
    /// `risk_amount` as a percent of account balance; absent without a stop
    pub risk_percent: Option<Decimal>,
}

/// Position-sizing result for an account against a price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSizing {
    pub account_balance: Decimal,
    pub leverage: Decimal,
    pub current_price: Decimal,
    /// Largest position the margin supports, in base currency units
    pub max_position_size: Decimal,
    /// `max_position_size` in broker lots
    pub max_lot_size: Decimal,
    /// Per-target sizing rows keyed by requested profit (account currency)
    pub targets: BTreeMap<Decimal, TargetSizing>,
}

/// Inputs for a sizing computation
#[derive(Debug, Clone)]
pub struct SizingRequest {
    pub account_balance: Decimal,
    pub leverage: Decimal,
    pub current_price: Decimal,
    pub asset_class: AssetClass,
    pub direction: Option<TradeDirection>,
    pub stop_loss: Option<Decimal>,
    /// Requested profit targets in account currency
    pub profit_targets: Vec<Decimal>,
}

/// Pure position-sizing calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskCalculator;

impl RiskCalculator {
    /// Compute the maximum safe position size and per-target sizing table
    ///
    /// Non-positive balance, leverage or price is rejected — never silently
    /// clamped to a default that could mislead a trader about real exposure.
    /// Missing stops make the stop-dependent fields unavailable rather than
    /// guessed, and a zero stop distance never divides.
    pub fn size(request: &SizingRequest) -> Result<PositionSizing> {
        if request.account_balance <= Decimal::ZERO {
            return Err(EngineError::InvalidInput(format!(
                "account balance must be positive, got {}",
                request.account_balance
            )));
        }
        if request.leverage <= Decimal::ZERO {
            return Err(EngineError::InvalidInput(format!(
                "leverage must be positive, got {}",
                request.leverage
            )));
        }
        if request.current_price <= Decimal::ZERO {
            return Err(EngineError::InvalidInput(format!(
                "current price must be positive, got {}",
                request.current_price
            )));
        }

        let max_position_size =
            request.account_balance * request.leverage / request.current_price;
        let lot = lot_size(request.asset_class);
        let max_lot_size = max_position_size / lot;

        let stop_distance = request.stop_loss.and_then(|stop| {
            let distance = (request.current_price - stop).abs();
            (distance > Decimal::ZERO).then_some(distance)
        });
        let direction_sign = Decimal::from(
            request
                .direction
                .map(|d| d.sign())
                .filter(|s| *s != 0)
                .unwrap_or(1),
        );

        let mut targets = BTreeMap::new();
        for &profit in &request.profit_targets {
            if profit <= Decimal::ZERO {
                return Err(EngineError::InvalidInput(format!(
                    "profit target must be positive, got {}",
                    profit
                )));
            }

            let price_move_needed = profit / max_position_size * direction_sign;
            let price_move_percent =
                price_move_needed / request.current_price * dec!(100);

            let (required_size, required_lot, risk_amount, risk_percent) = match stop_distance {
                Some(distance) => {
                    let size = (profit / distance).min(max_position_size);
                    let risk = size * distance;
                    (
                        Some(size),
                        Some(size / lot),
                        Some(risk),
                        Some(risk / request.account_balance * dec!(100)),
                    )
                }
                None => (None, None, None, None),
            };

            targets.insert(
                profit,
                TargetSizing {
                    price_move_needed,
                    price_move_percent,
                    required_size,
                    required_lot,
                    risk_amount,
                    risk_percent,
                },
            );
        }

        Ok(PositionSizing {
            account_balance: request.account_balance,
            leverage: request.leverage,
            current_price: request.current_price,
            max_position_size,
            max_lot_size,
            targets,
        })
    }
}
