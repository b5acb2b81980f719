//! Risk and position-sizing calculator

pub mod calculator;

pub use calculator::{PositionSizing, RiskCalculator, SizingRequest, TargetSizing};
