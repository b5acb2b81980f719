//! Market-session oracle
//!
//! Pure time-window arithmetic scoring trading-session liquidity for an
//! instrument at a given UTC instant. No I/O and no global clock reads —
//! callers pass `now` explicitly so tests stay deterministic.

pub mod affinity;
pub mod oracle;

pub use affinity::{AffinityRule, SessionAffinityTable};
pub use oracle::{SessionOracle, SessionWindow};
