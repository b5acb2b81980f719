//! EMA state-transition classifier

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ema::Ema;
use crate::common::errors::{EngineError, Result};
use crate::common::types::{validate_series, PricePoint, TradeDirection};

/// Default EMA periods
pub const DEFAULT_PERIODS: [u32; 3] = [10, 20, 50];

/// Bounce tolerance band around an EMA, as a fraction of the EMA value (10 bps)
const BOUNCE_TOLERANCE: Decimal = dec!(0.001);

/// Minimum breakthrough penetration, as a fraction of the EMA value (5 bps).
/// Closes that merely graze the line do not count.
const BREAK_MIN_PENETRATION: Decimal = dec!(0.0005);

/// Per-period EMA values for a series; periods without enough data are absent
pub type EmaSnapshot = BTreeMap<u32, Decimal>;

/// Boolean state flags for one EMA period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSignals {
    /// Latest close is above the EMA
    pub above: bool,
    /// Price touched the EMA band on the prior bar and closed away from it
    /// in the direction of the preceding trend
    pub bouncing_off: bool,
    /// Latest bar opened one side of the EMA and closed on the other with
    /// meaningful penetration
    pub breaking_through: bool,
}

/// Signal state for a series at one timeframe
///
/// Flags are mutually describable, not mutually exclusive — a bar can bounce
/// and sit above the same EMA. `None` on the crossing flags means the
/// short/long pair lacked enough data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalState {
    /// Per-period flags; periods without enough data are absent
    pub periods: BTreeMap<u32, PeriodSignals>,
    /// Short EMA crossed above the long EMA on the latest bar
    pub crossing_above: Option<bool>,
    /// Short EMA crossed below the long EMA on the latest bar
    pub crossing_below: Option<bool>,
}

impl SignalState {
    /// Flags for a specific period, if computed
    pub fn period(&self, period: u32) -> Option<&PeriodSignals> {
        self.periods.get(&period)
    }

    /// Directional bias implied by the EMA state
    ///
    /// A fresh crossover dominates; otherwise unanimous above/below across
    /// all computed periods decides, and mixed evidence yields `None`.
    pub fn direction_bias(&self) -> TradeDirection {
        if self.crossing_above == Some(true) {
            return TradeDirection::Buy;
        }
        if self.crossing_below == Some(true) {
            return TradeDirection::Sell;
        }
        if self.periods.is_empty() {
            return TradeDirection::None;
        }
        if self.periods.values().all(|p| p.above) {
            TradeDirection::Buy
        } else if self.periods.values().all(|p| !p.above) {
            TradeDirection::Sell
        } else {
            TradeDirection::None
        }
    }

    /// Whether the state agrees with a proposed trade direction
    pub fn confirms(&self, direction: TradeDirection) -> bool {
        direction.is_directional() && self.direction_bias() == direction
    }
}

/// Pure EMA state classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalClassifier;

impl SignalClassifier {
    /// Classify a single-timeframe series against the requested periods
    ///
    /// The series must be strictly ascending by timestamp. Periods longer
    /// than the series are reported as unavailable rather than computed on
    /// insufficient data.
    pub fn classify(series: &[PricePoint], periods: &[u32]) -> Result<(EmaSnapshot, SignalState)> {
        validate_series(series)?;
        if series.is_empty() {
            return Err(EngineError::InvalidInput("empty price series".to_string()));
        }
        if periods.is_empty() || periods.iter().any(|p| *p == 0) {
            return Err(EngineError::InvalidInput(
                "EMA periods must be non-empty and positive".to_string(),
            ));
        }

        let last = &series[series.len() - 1];
        let prior = series.len().checked_sub(2).map(|i| &series[i]);

        let mut snapshot = EmaSnapshot::new();
        let mut state = SignalState::default();
        let mut histories: BTreeMap<u32, Vec<Decimal>> = BTreeMap::new();

        for &period in periods {
            let history = ema_history(series, period);
            if let Some(&current) = history.last() {
                snapshot.insert(period, current);
                state.periods.insert(
                    period,
                    classify_period(&history, last, prior),
                );
            }
            histories.insert(period, history);
        }

        let mut sorted: Vec<u32> = periods.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() >= 2 {
            let (short, long) = (sorted[0], sorted[1]);
            let crossings = classify_crossing(&histories[&short], &histories[&long]);
            if let Some((above, below)) = crossings {
                state.crossing_above = Some(above);
                state.crossing_below = Some(below);
            }
        }

        Ok((snapshot, state))
    }

    /// Classify a short-horizon/long-horizon timeframe pair
    ///
    /// Used by callers requesting a multi-timeframe filter; each series is
    /// classified independently with the same periods.
    #[allow(clippy::type_complexity)]
    pub fn classify_pair(
        short_series: &[PricePoint],
        long_series: &[PricePoint],
        periods: &[u32],
    ) -> Result<((EmaSnapshot, SignalState), (EmaSnapshot, SignalState))> {
        let short = Self::classify(short_series, periods)?;
        let long = Self::classify(long_series, periods)?;
        Ok((short, long))
    }
}

/// EMA value per bar from the first warm bar onward
fn ema_history(series: &[PricePoint], period: u32) -> Vec<Decimal> {
    let mut ema = Ema::new(period);
    series
        .iter()
        .filter_map(|point| ema.update(point.close))
        .collect()
}

/// Per-period flags from the EMA history and the last two bars
fn classify_period(
    history: &[Decimal],
    last: &PricePoint,
    prior: Option<&PricePoint>,
) -> PeriodSignals {
    let current = history[history.len() - 1];
    let above = last.close > current;

    let breaking_through = {
        let penetration = current * BREAK_MIN_PENETRATION;
        (last.open < current && last.close > current + penetration)
            || (last.open > current && last.close < current - penetration)
    };

    // Bounce needs the prior bar, the EMA under it, and a trend slope —
    // three consecutive EMA values in total.
    let bouncing_off = match (prior, history.len() >= 3) {
        (Some(prior_bar), true) => {
            let prev = history[history.len() - 2];
            let slope = prev - history[history.len() - 3];
            let band = prev * BOUNCE_TOLERANCE;
            let touched = prior_bar.low <= prev + band && prior_bar.high >= prev - band;
            let current_band = current * BOUNCE_TOLERANCE;
            touched
                && ((slope > Decimal::ZERO && last.close > current + current_band)
                    || (slope < Decimal::ZERO && last.close < current - current_band))
        }
        _ => false,
    };

    PeriodSignals {
        above,
        bouncing_off,
        breaking_through,
    }
}

/// Crossing flags from the short/long EMA histories
///
/// Compares the sign of `(short - long)` on the last two bars; a flip from
/// negative-or-zero to positive is a bullish cross, the reverse is bearish.
/// The two flags are never simultaneously true.
fn classify_crossing(short: &[Decimal], long: &[Decimal]) -> Option<(bool, bool)> {
    if short.len() < 2 || long.len() < 2 {
        return None;
    }
    let diff_last = short[short.len() - 1] - long[long.len() - 1];
    let diff_prev = short[short.len() - 2] - long[long.len() - 2];

    let crossing_above = diff_prev <= Decimal::ZERO && diff_last > Decimal::ZERO;
    let crossing_below = diff_prev >= Decimal::ZERO && diff_last < Decimal::ZERO;
    Some((crossing_above, crossing_below))
}
