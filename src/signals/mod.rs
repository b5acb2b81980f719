//! Technical-signal classifier
//!
//! Derives per-period EMA values and boolean state transitions (crossover,
//! bounce, breakthrough) from a candle series. Pure computation — data
//! retrieval lives behind the `DataProvider` trait.

pub mod classifier;
pub mod ema;

pub use classifier::{
    EmaSnapshot, PeriodSignals, SignalClassifier, SignalState, DEFAULT_PERIODS,
};
pub use ema::Ema;
