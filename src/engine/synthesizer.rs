//! Recommendation synthesizer
//!
//! Orchestrates the sentiment source, session oracle, signal classifier and
//! risk calculator into a single validated recommendation.
//!
//! # Merge policy
//!
//! The sentiment source supplies the primary direction, price levels and
//! confidence. The synthesizer never overrides those levels — it validates
//! and annotates them: recomputes the risk-reward ratio under the
//! consistency invariant, runs the safe-entry check, attaches a session
//! warning for non-crypto instruments in weak sessions, and sizes the
//! position when account parameters were supplied.
//!
//! # Failure semantics
//!
//! Upstream failures, timeouts and unparsable sentiment replies produce a
//! degraded recommendation (`direction = None`, neutral confidence, a single
//! error factor) instead of an error. Invalid caller input is rejected at
//! the boundary. Degraded results are never cached, so the next request
//! retries the upstream.
//!
//! # Caching
//!
//! Successful recommendations are cached by `(symbol, provider)` for the
//! configured TTL with single-flight population. On a cache hit the session
//! context and session warning are recomputed live — clock-dependent fields
//! must not go stale inside the TTL window — and every other field is
//! returned verbatim.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info, instrument, warn};

use super::cache::{CacheKey, RecommendationCache};
use super::types::{
    classify_order_type, classify_risk, risk_reward_ratio, safe_entry_check, AccountParams,
    Recommendation, ScalpPlan, NEUTRAL_CONFIDENCE, SENTIMENT_ERROR_FACTOR,
};
use crate::common::errors::{EngineError, Result};
use crate::common::types::{
    Instrument, InstrumentCatalog, OrderType, RiskLevel, Timeframe, TradeDirection,
};
use crate::config::types::EngineSettings;
use crate::providers::traits::{DataProvider, NewsProvider, SentimentEstimate, SentimentSource};
use crate::risk::{RiskCalculator, SizingRequest};
use crate::session::{SessionOracle, SessionWindow};
use crate::signals::{SignalClassifier, SignalState, DEFAULT_PERIODS};

/// Headlines attached per recommendation when a news provider is wired
const NEWS_HEADLINE_COUNT: usize = 3;

/// Minimum scalp validity
const SCALP_VALIDITY_MINUTES: i64 = 5;

/// Technical context computed from the data provider, when available
struct TechnicalSnapshot {
    current_price: Decimal,
    primary: SignalState,
    scalp: Option<SignalState>,
}

/// The recommendation synthesizer
pub struct TradeAdvisor {
    sentiment: Arc<dyn SentimentSource>,
    data: Option<Arc<dyn DataProvider>>,
    news: Option<Arc<dyn NewsProvider>>,
    oracle: SessionOracle,
    catalog: InstrumentCatalog,
    settings: EngineSettings,
    sentiment_timeout: StdDuration,
    collaborator_timeout: StdDuration,
    cache: RecommendationCache,
}

impl TradeAdvisor {
    pub fn new(
        sentiment: Arc<dyn SentimentSource>,
        oracle: SessionOracle,
        catalog: InstrumentCatalog,
        settings: EngineSettings,
    ) -> Self {
        let cache = RecommendationCache::new(chrono::Duration::seconds(
            settings.cache_ttl_seconds as i64,
        ));
        Self {
            sentiment,
            data: None,
            news: None,
            oracle,
            catalog,
            settings,
            sentiment_timeout: StdDuration::from_secs(300),
            collaborator_timeout: StdDuration::from_secs(30),
            cache,
        }
    }

    /// Attach a market data provider, enabling technical confirmation
    pub fn with_data_provider(mut self, data: Arc<dyn DataProvider>) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach an optional news provider for factor enrichment
    pub fn with_news_provider(mut self, news: Arc<dyn NewsProvider>) -> Self {
        self.news = Some(news);
        self
    }

    /// Override the sentiment call deadline
    pub fn with_sentiment_timeout(mut self, timeout: StdDuration) -> Self {
        self.sentiment_timeout = timeout;
        self
    }

    /// Classify a symbol against the instrument catalog
    pub fn classify_symbol(&self, symbol: &str) -> Instrument {
        self.catalog.classify(symbol)
    }

    /// Session context for an instrument at `now`
    pub fn session_info(&self, instrument: &Instrument, now: DateTime<Utc>) -> SessionWindow {
        self.oracle.session_info(instrument, now)
    }

    /// Bounded concurrency for batch scans
    pub fn scan_concurrency(&self) -> usize {
        self.settings.max_scan_concurrency.max(1)
    }

    /// Drop any cached recommendation for a symbol
    pub async fn invalidate(&self, symbol: &str) {
        let instrument = self.catalog.classify(symbol);
        let key = CacheKey::new(instrument.symbol, self.sentiment.provider_name());
        self.cache.invalidate(&key).await;
    }

    /// Directional bias from the EMA state, if market data is available
    ///
    /// Used by the batch scanner as a cheap pre-filter before spending a
    /// sentiment call.
    pub async fn technical_bias(&self, instrument: &Instrument) -> Option<TradeDirection> {
        self.fetch_technical(instrument)
            .await
            .map(|snapshot| snapshot.primary.direction_bias())
    }

    /// Produce a recommendation for a symbol
    ///
    /// `account` enables position sizing against the supplied balance and
    /// leverage; `profit_targets` (account currency) populate the per-target
    /// sizing table.
    #[instrument(skip(self, account, profit_targets))]
    pub async fn recommend(
        &self,
        symbol: &str,
        account: Option<AccountParams>,
        profit_targets: &[Decimal],
    ) -> Result<Recommendation> {
        if symbol.trim().is_empty() {
            return Err(EngineError::InvalidInput("empty symbol".to_string()));
        }
        if let Some(params) = account {
            if params.balance <= Decimal::ZERO || params.leverage <= Decimal::ZERO {
                return Err(EngineError::InvalidInput(format!(
                    "account balance and leverage must be positive, got {} / {}",
                    params.balance, params.leverage
                )));
            }
        }

        let instrument = self.catalog.classify(symbol);
        let key = CacheKey::new(&instrument.symbol, self.sentiment.provider_name());

        let now = Utc::now();
        if let Some(hit) = self.cache.get(&key, now).await {
            debug!("cache hit for {}", instrument.symbol);
            return Ok(self.refresh_session_fields(hit, &instrument, now));
        }

        // Single-flight: the first caller computes, concurrent callers for
        // the same key wait here and then hit the cache.
        let guard = self.cache.population_guard(&key).await;
        let _populating = guard.lock().await;

        let now = Utc::now();
        if let Some(hit) = self.cache.get(&key, now).await {
            debug!("cache hit after population wait for {}", instrument.symbol);
            return Ok(self.refresh_session_fields(hit, &instrument, now));
        }

        let (recommendation, degraded) = self
            .build_recommendation(&instrument, account, profit_targets, now)
            .await?;

        if degraded {
            info!("degraded recommendation for {}", instrument.symbol);
        } else {
            self.cache.insert(key, recommendation.clone()).await;
        }
        Ok(recommendation)
    }

    /// Recompute the clock-dependent fields on a cached recommendation
    fn refresh_session_fields(
        &self,
        mut recommendation: Recommendation,
        instrument: &Instrument,
        now: DateTime<Utc>,
    ) -> Recommendation {
        let session = self.oracle.session_info(instrument, now);
        recommendation.session_warning = self.session_warning(instrument, &session);
        recommendation.session = session;
        recommendation
    }

    async fn build_recommendation(
        &self,
        instrument: &Instrument,
        account: Option<AccountParams>,
        profit_targets: &[Decimal],
        now: DateTime<Utc>,
    ) -> Result<(Recommendation, bool)> {
        let session = self.oracle.session_info(instrument, now);
        let technical = self.fetch_technical(instrument).await;

        let estimate = match tokio::time::timeout(
            self.sentiment_timeout,
            self.sentiment.estimate(&instrument.symbol),
        )
        .await
        {
            Ok(Ok(estimate)) => Ok(estimate),
            Ok(Err(error)) if error.is_recoverable() => Err(error),
            Ok(Err(error)) => return Err(error),
            Err(_) => Err(EngineError::Timeout(
                "sentiment request exceeded deadline".to_string(),
            )),
        };

        match estimate {
            Ok(estimate) => {
                let recommendation = self
                    .merge(instrument, estimate, technical, session, account, profit_targets, now)
                    .await?;
                Ok((recommendation, false))
            }
            Err(error) => {
                warn!("sentiment source failed for {}: {}", instrument.symbol, error);
                Ok((self.degraded(instrument, technical, session, now), true))
            }
        }
    }

    /// Merge the sentiment estimate with session, signal and sizing context
    async fn merge(
        &self,
        instrument: &Instrument,
        estimate: SentimentEstimate,
        technical: Option<TechnicalSnapshot>,
        session: SessionWindow,
        account: Option<AccountParams>,
        profit_targets: &[Decimal],
        now: DateTime<Utc>,
    ) -> Result<Recommendation> {
        let direction = estimate.direction;
        let current_price = technical
            .as_ref()
            .map(|snapshot| snapshot.current_price)
            .or(estimate.entry)
            .unwrap_or(Decimal::ZERO);
        let best_entry = estimate.entry.unwrap_or(current_price);
        let tolerance = self.entry_tolerance(current_price);

        let ratio = risk_reward_ratio(direction, current_price, estimate.stop_loss, estimate.take_profit);
        let (safe_entry, safe_entry_reason) = safe_entry_check(
            direction,
            current_price,
            best_entry,
            estimate.stop_loss,
            tolerance,
        );
        let order_type = classify_order_type(direction, current_price, best_entry, tolerance);
        let risk_level = classify_risk(direction, current_price, estimate.stop_loss);

        let mut factors = estimate.factors.clone();
        match &technical {
            Some(snapshot) => {
                if snapshot.primary.confirms(direction) {
                    factors.push(format!("EMA state confirms {} bias", direction));
                } else if snapshot.primary.direction_bias().is_directional()
                    && direction.is_directional()
                {
                    factors.push("EMA state disagrees with the sentiment direction".to_string());
                }
            }
            None => factors.push("Technical signals unavailable".to_string()),
        }
        self.append_news_factors(instrument, &mut factors).await;

        let sizing = match account {
            Some(params) if current_price > Decimal::ZERO => Some(RiskCalculator::size(
                &SizingRequest {
                    account_balance: params.balance,
                    leverage: params.leverage,
                    current_price,
                    asset_class: instrument.asset_class,
                    direction: Some(direction),
                    stop_loss: estimate.stop_loss,
                    profit_targets: profit_targets.to_vec(),
                },
            )?),
            _ => None,
        };

        let scalp = self.scalp_plan(&estimate, technical.as_ref(), current_price, now);
        let seconds_to_entry =
            self.estimate_seconds_to_entry(direction, safe_entry, &session);
        let session_warning = self.session_warning(instrument, &session);

        Ok(Recommendation {
            symbol: instrument.symbol.clone(),
            provider: self.sentiment.provider_name().to_string(),
            direction,
            current_price,
            best_entry,
            order_type,
            stop_loss: estimate.stop_loss,
            take_profit: estimate.take_profit,
            confidence: estimate.confidence.clamp(0.0, 1.0),
            risk_level,
            risk_reward_ratio: ratio,
            is_trade_recommended: direction.is_directional() && ratio > Decimal::ZERO,
            session,
            session_warning,
            seconds_to_entry,
            generated_at: now,
            valid_until: now + self.cache.ttl(),
            safe_entry,
            safe_entry_reason,
            sizing,
            factors,
            scalp,
        })
    }

    /// Neutral recommendation emitted when the sentiment source is down
    fn degraded(
        &self,
        instrument: &Instrument,
        technical: Option<TechnicalSnapshot>,
        session: SessionWindow,
        now: DateTime<Utc>,
    ) -> Recommendation {
        let current_price = technical
            .map(|snapshot| snapshot.current_price)
            .unwrap_or(Decimal::ZERO);
        let session_warning = self.session_warning(instrument, &session);

        Recommendation {
            symbol: instrument.symbol.clone(),
            provider: self.sentiment.provider_name().to_string(),
            direction: TradeDirection::None,
            current_price,
            best_entry: current_price,
            order_type: OrderType::Market,
            stop_loss: None,
            take_profit: None,
            confidence: NEUTRAL_CONFIDENCE,
            risk_level: RiskLevel::High,
            risk_reward_ratio: Decimal::ZERO,
            is_trade_recommended: false,
            session,
            session_warning,
            seconds_to_entry: None,
            generated_at: now,
            valid_until: now + self.cache.ttl(),
            safe_entry: false,
            safe_entry_reason: "sentiment data unavailable".to_string(),
            sizing: None,
            factors: vec![SENTIMENT_ERROR_FACTOR.to_string()],
            scalp: None,
        }
    }

    /// Candles → EMA classification for the primary and scalp timeframes
    ///
    /// Any provider failure logs a warning and reports signals unavailable;
    /// it never fails the recommendation.
    async fn fetch_technical(&self, instrument: &Instrument) -> Option<TechnicalSnapshot> {
        let provider = self.data.as_ref()?;
        let primary_timeframe = match Timeframe::parse(&self.settings.primary_timeframe) {
            Ok(timeframe) => timeframe,
            Err(error) => {
                warn!("bad primary timeframe in settings: {}", error);
                return None;
            }
        };

        let series = match tokio::time::timeout(
            self.collaborator_timeout,
            provider.candles(&instrument.symbol, primary_timeframe, self.settings.candle_count),
        )
        .await
        {
            Ok(Ok(series)) if !series.is_empty() => series,
            Ok(Ok(_)) => {
                warn!("data provider returned no candles for {}", instrument.symbol);
                return None;
            }
            Ok(Err(error)) => {
                warn!("data provider failed for {}: {}", instrument.symbol, error);
                return None;
            }
            Err(_) => {
                warn!("data provider timed out for {}", instrument.symbol);
                return None;
            }
        };

        let current_price = series[series.len() - 1].close;
        let primary = match SignalClassifier::classify(&series, &DEFAULT_PERIODS) {
            Ok((_, state)) => state,
            Err(error) => {
                warn!("signal classification failed for {}: {}", instrument.symbol, error);
                return None;
            }
        };

        let scalp = self.fetch_scalp_state(instrument, provider).await;
        Some(TechnicalSnapshot {
            current_price,
            primary,
            scalp,
        })
    }

    async fn fetch_scalp_state(
        &self,
        instrument: &Instrument,
        provider: &Arc<dyn DataProvider>,
    ) -> Option<SignalState> {
        let timeframe = Timeframe::parse(&self.settings.scalp_timeframe).ok()?;
        let series = tokio::time::timeout(
            self.collaborator_timeout,
            provider.candles(&instrument.symbol, timeframe, self.settings.candle_count),
        )
        .await
        .ok()?
        .ok()?;
        SignalClassifier::classify(&series, &DEFAULT_PERIODS)
            .ok()
            .map(|(_, state)| state)
    }

    /// Fast-scalp sub-plan: quarter-distance levels when the short
    /// timeframe agrees with the primary direction
    fn scalp_plan(
        &self,
        estimate: &SentimentEstimate,
        technical: Option<&TechnicalSnapshot>,
        current_price: Decimal,
        now: DateTime<Utc>,
    ) -> Option<ScalpPlan> {
        let snapshot = technical?;
        let scalp_state = snapshot.scalp.as_ref()?;
        if !scalp_state.confirms(estimate.direction) {
            return None;
        }
        let stop = estimate.stop_loss?;
        let target = estimate.take_profit?;
        if risk_reward_ratio(estimate.direction, current_price, Some(stop), Some(target))
            <= Decimal::ZERO
        {
            return None;
        }

        let quarter = dec!(0.25);
        let (scalp_stop, scalp_target) = match estimate.direction {
            TradeDirection::Buy => (
                current_price - (current_price - stop) * quarter,
                current_price + (target - current_price) * quarter,
            ),
            TradeDirection::Sell => (
                current_price + (stop - current_price) * quarter,
                current_price - (current_price - target) * quarter,
            ),
            TradeDirection::None => return None,
        };

        Some(ScalpPlan {
            direction: estimate.direction,
            entry: current_price,
            stop_loss: scalp_stop,
            take_profit: scalp_target,
            valid_until: now + chrono::Duration::minutes(SCALP_VALIDITY_MINUTES),
        })
    }

    /// Session warning for non-crypto instruments in a weaker session than
    /// the instrument's recommended one; always absent for crypto
    fn session_warning(&self, instrument: &Instrument, session: &SessionWindow) -> Option<String> {
        if instrument.is_crypto() {
            return None;
        }
        let recommended_liquidity = self
            .oracle
            .session_liquidity(instrument, session.recommended_session);
        (session.liquidity_level < recommended_liquidity).then(|| {
            format!(
                "Liquidity is {}/5 in the {} session; {} trades best during the {} session",
                session.liquidity_level,
                session.current_session,
                instrument.symbol,
                session.recommended_session
            )
        })
    }

    /// Rough horizon until price is expected at the best entry
    fn estimate_seconds_to_entry(
        &self,
        direction: TradeDirection,
        safe_entry: bool,
        session: &SessionWindow,
    ) -> Option<i64> {
        if !direction.is_directional() {
            return None;
        }
        if safe_entry {
            return Some(0);
        }
        if session.liquidity_level < 3 {
            return Some(session.seconds_until_next.max(0));
        }
        let timeframe = Timeframe::parse(&self.settings.primary_timeframe).unwrap_or(Timeframe::H1);
        Some(timeframe.duration().num_seconds())
    }

    async fn append_news_factors(&self, instrument: &Instrument, factors: &mut Vec<String>) {
        let Some(news) = self.news.as_ref() else {
            return;
        };
        match tokio::time::timeout(
            self.collaborator_timeout,
            news.news_for(&instrument.symbol, NEWS_HEADLINE_COUNT),
        )
        .await
        {
            Ok(Ok(articles)) => {
                for article in articles {
                    factors.push(format!("News: {} ({})", article.title, article.source));
                }
            }
            Ok(Err(error)) => warn!("news provider failed for {}: {}", instrument.symbol, error),
            Err(_) => warn!("news provider timed out for {}", instrument.symbol),
        }
    }

    fn entry_tolerance(&self, current_price: Decimal) -> Decimal {
        let percent =
            Decimal::from_f64(self.settings.entry_tolerance_percent).unwrap_or(dec!(0.1));
        current_price.abs() * percent / dec!(100)
    }
}
