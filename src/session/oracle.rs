//! Session resolution and liquidity scoring

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::affinity::SessionAffinityTable;
use crate::common::types::{Instrument, TradingSession};

/// Session context for an instrument at a given instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    /// Session active at `now_utc`
    pub current_session: TradingSession,
    /// Liquidity score in [1, 5]
    pub liquidity_level: u8,
    /// Session the instrument trades best in
    pub recommended_session: TradingSession,
    /// Human-readable session guidance
    pub rationale: String,
    /// Instant the window was computed for
    pub now_utc: DateTime<Utc>,
    /// Next primary session to open
    pub next_session: TradingSession,
    /// UTC instant the next session opens
    pub next_session_start: DateTime<Utc>,
    /// Seconds until the next session opens
    pub seconds_until_next: i64,
}

impl SessionWindow {
    /// Duration until the next session opens
    pub fn time_until_next(&self) -> Duration {
        Duration::seconds(self.seconds_until_next)
    }
}

/// Fixed UTC session windows, in minutes since midnight.
///
/// Asian wraps midnight: [23:00, 08:00). London [07:00, 16:00).
/// New York [12:00, 21:00).
const ASIAN_START_MIN: u32 = 23 * 60;
const ASIAN_END_MIN: u32 = 8 * 60;
const LONDON_START_MIN: u32 = 7 * 60;
const LONDON_END_MIN: u32 = 16 * 60;
const NEWYORK_START_MIN: u32 = 12 * 60;
const NEWYORK_END_MIN: u32 = 21 * 60;

/// Primary session open times used for next-session enumeration
const SESSION_OPENS: [(TradingSession, u32); 3] = [
    (TradingSession::London, LONDON_START_MIN),
    (TradingSession::NewYork, NEWYORK_START_MIN),
    (TradingSession::Asian, ASIAN_START_MIN),
];

/// Pure session oracle
///
/// Resolves the active trading session, scores its liquidity and computes
/// the next session open for a given instrument and instant.
#[derive(Debug, Clone)]
pub struct SessionOracle {
    affinity: SessionAffinityTable,
}

impl SessionOracle {
    pub fn new(affinity: SessionAffinityTable) -> Self {
        Self { affinity }
    }

    /// Session context for `instrument` at `now`
    ///
    /// For crypto instruments the recommended session is forced equal to the
    /// current session and liquidity is forced to 5 — a 24/7 market never
    /// gets "wait for a better session" advice.
    pub fn session_info(&self, instrument: &Instrument, now: DateTime<Utc>) -> SessionWindow {
        let current_session = current_session_at(now);
        let (next_session, next_session_start) = next_session_after(now);

        let (liquidity_level, recommended_session, rationale) = if instrument.is_crypto() {
            (
                5,
                current_session,
                format!("{} trades 24/7; session timing does not apply", instrument.symbol),
            )
        } else {
            let liquidity = self.session_liquidity(instrument, current_session);
            let recommended = self.affinity.recommended_for(instrument);
            let rationale = if liquidity >= self.session_liquidity(instrument, recommended) {
                format!(
                    "{} session active (liquidity {}/5); good conditions for {}",
                    current_session, liquidity, instrument.symbol
                )
            } else {
                format!(
                    "{} session active (liquidity {}/5); {} trades best during the {} session",
                    current_session, liquidity, instrument.symbol, recommended
                )
            };
            (liquidity, recommended, rationale)
        };

        SessionWindow {
            current_session,
            liquidity_level,
            recommended_session,
            rationale,
            now_utc: now,
            next_session,
            next_session_start,
            seconds_until_next: (next_session_start - now).num_seconds(),
        }
    }

    /// Liquidity score for `instrument` during `session`, in [1, 5]
    ///
    /// Base score per session, +1 (capped at 5) when the instrument has a
    /// pair/session affinity. Crypto instruments always score 5.
    pub fn session_liquidity(&self, instrument: &Instrument, session: TradingSession) -> u8 {
        if instrument.is_crypto() {
            return 5;
        }
        let base = base_liquidity(session);
        if self.affinity.boost_applies(instrument, session) {
            (base + 1).min(5)
        } else {
            base
        }
    }
}

impl Default for SessionOracle {
    fn default() -> Self {
        Self::new(SessionAffinityTable::default())
    }
}

/// Base liquidity score per session
fn base_liquidity(session: TradingSession) -> u8 {
    match session {
        TradingSession::LondonNewYorkOverlap => 5,
        TradingSession::London | TradingSession::NewYork => 4,
        TradingSession::AsianLondonOverlap => 3,
        TradingSession::Asian => 2,
        TradingSession::Closed => 1,
    }
}

/// Resolve the session active at `now`
///
/// Resolution order: London∩NewYork, Asian∩London, Asian, London, NewYork,
/// Closed.
fn current_session_at(now: DateTime<Utc>) -> TradingSession {
    let minute = minute_of_day(now);
    let in_asian = minute >= ASIAN_START_MIN || minute < ASIAN_END_MIN;
    let in_london = (LONDON_START_MIN..LONDON_END_MIN).contains(&minute);
    let in_newyork = (NEWYORK_START_MIN..NEWYORK_END_MIN).contains(&minute);

    if in_london && in_newyork {
        TradingSession::LondonNewYorkOverlap
    } else if in_asian && in_london {
        TradingSession::AsianLondonOverlap
    } else if in_asian {
        TradingSession::Asian
    } else if in_london {
        TradingSession::London
    } else if in_newyork {
        TradingSession::NewYork
    } else {
        TradingSession::Closed
    }
}

/// Nearest primary session open strictly after `now`
///
/// Enumerates today's remaining opens plus tomorrow's full set, so the next
/// Asian open can be tonight rather than tomorrow.
fn next_session_after(now: DateTime<Utc>) -> (TradingSession, DateTime<Utc>) {
    let today = now.date_naive();
    let mut candidates = Vec::with_capacity(SESSION_OPENS.len() * 2);

    for day_offset in 0..2 {
        let date = today + Duration::days(day_offset);
        for (session, open_min) in SESSION_OPENS {
            let time = NaiveTime::from_hms_opt(open_min / 60, open_min % 60, 0)
                .expect("session open minutes are valid times");
            let start = Utc.from_utc_datetime(&date.and_time(time));
            if start > now {
                candidates.push((session, start));
            }
        }
    }

    candidates
        .into_iter()
        .min_by_key(|(_, start)| *start)
        .expect("tomorrow always contains a session open")
}

fn minute_of_day(now: DateTime<Utc>) -> u32 {
    use chrono::Timelike;
    now.hour() * 60 + now.minute()
}
