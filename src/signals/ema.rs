//! Exponential Moving Average — incremental computation
//!
//! Seeded with the simple average of the first `period` observations, then
//! smoothed recursively: `ema = close * k + prev * (1 - k)` with
//! `k = 2 / (period + 1)`.

use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Ema {
    period: u32,
    k: Decimal,
    seed_sum: Decimal,
    count: u32,
    value: Option<Decimal>,
}

impl Ema {
    pub fn new(period: u32) -> Self {
        Self {
            period,
            k: Decimal::from(2) / Decimal::from(period + 1),
            seed_sum: Decimal::ZERO,
            count: 0,
            value: None,
        }
    }

    /// Feed one close, returning the current EMA once warm
    pub fn update(&mut self, close: Decimal) -> Option<Decimal> {
        self.count += 1;
        match self.value {
            None => {
                self.seed_sum += close;
                if self.count == self.period {
                    self.value = Some(self.seed_sum / Decimal::from(self.period));
                }
            }
            Some(prev) => {
                self.value = Some(close * self.k + prev * (Decimal::ONE - self.k));
            }
        }
        self.value
    }

    /// Current EMA value; `None` until `period` observations have been seen
    pub fn value(&self) -> Option<Decimal> {
        self.value
    }

    pub fn is_warm(&self) -> bool {
        self.value.is_some()
    }

    pub fn period(&self) -> u32 {
        self.period
    }
}
