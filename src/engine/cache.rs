//! TTL cache for recommendations
//!
//! Keyed by `(symbol, provider)`. Entries are immutable once stored and
//! evicted by TTL expiry or explicit invalidation. Per-key population
//! guards give single-flight semantics: the first caller computes, any
//! concurrent caller for the same key awaits the same result.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::types::Recommendation;

/// Cache key: symbol plus sentiment provider identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub provider: String,
}

impl CacheKey {
    pub fn new(symbol: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            provider: provider.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    recommendation: Recommendation,
    expires_at: DateTime<Utc>,
}

/// In-memory TTL cache owned by the synthesizer
pub struct RecommendationCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    // Population guards for single-flight; never held across the outer lock
    inflight: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl RecommendationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `key` at `now`, if any; expired entries are evicted
    pub async fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Recommendation> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.recommendation.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a recommendation, replacing any previous entry for the key
    pub async fn insert(&self, key: CacheKey, recommendation: Recommendation) {
        let expires_at = recommendation.generated_at + self.ttl;
        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            CacheEntry {
                recommendation,
                expires_at,
            },
        );
    }

    /// Explicitly drop the entry for a key
    pub async fn invalidate(&self, key: &CacheKey) {
        self.entries.lock().await.remove(key);
    }

    /// Drop all entries
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Number of stored entries, including not-yet-evicted expired ones
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Per-key population lock for single-flight de-duplication
    ///
    /// Callers lock the returned mutex, re-check `get`, and only then
    /// compute and `insert`. The outer map lock is released before the
    /// guard is awaited.
    pub async fn population_guard(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut inflight = self.inflight.lock().await;
        inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{OrderType, RiskLevel, TradeDirection, TradingSession};
    use crate::session::SessionWindow;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn sample_recommendation(generated_at: DateTime<Utc>) -> Recommendation {
        Recommendation {
            symbol: "EURUSD".to_string(),
            provider: "test".to_string(),
            direction: TradeDirection::Buy,
            current_price: dec!(1.0925),
            best_entry: dec!(1.0925),
            order_type: OrderType::Market,
            stop_loss: Some(dec!(1.0850)),
            take_profit: Some(dec!(1.1050)),
            confidence: 0.75,
            risk_level: RiskLevel::Medium,
            risk_reward_ratio: dec!(1.67),
            is_trade_recommended: true,
            session: SessionWindow {
                current_session: TradingSession::LondonNewYorkOverlap,
                liquidity_level: 5,
                recommended_session: TradingSession::LondonNewYorkOverlap,
                rationale: "test".to_string(),
                now_utc: generated_at,
                next_session: TradingSession::Asian,
                next_session_start: generated_at + Duration::hours(8),
                seconds_until_next: 8 * 3600,
            },
            session_warning: None,
            seconds_to_entry: Some(0),
            generated_at,
            valid_until: generated_at + Duration::minutes(5),
            safe_entry: true,
            safe_entry_reason: "price is at the entry zone".to_string(),
            sizing: None,
            factors: vec!["test factor".to_string()],
            scalp: None,
        }
    }

    #[tokio::test]
    async fn test_fresh_entry_is_returned() {
        let now = Utc::now();
        let cache = RecommendationCache::new(Duration::minutes(5));
        let key = CacheKey::new("EURUSD", "test");
        cache.insert(key.clone(), sample_recommendation(now)).await;

        let hit = cache.get(&key, now + Duration::minutes(4)).await;
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().risk_reward_ratio, dec!(1.67));
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted() {
        let now = Utc::now();
        let cache = RecommendationCache::new(Duration::minutes(5));
        let key = CacheKey::new("EURUSD", "test");
        cache.insert(key.clone(), sample_recommendation(now)).await;

        assert!(cache.get(&key, now + Duration::minutes(6)).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let now = Utc::now();
        let cache = RecommendationCache::new(Duration::minutes(5));
        let key = CacheKey::new("EURUSD", "test");
        cache.insert(key.clone(), sample_recommendation(now)).await;

        cache.invalidate(&key).await;
        assert!(cache.get(&key, now).await.is_none());
    }

    #[tokio::test]
    async fn test_keys_are_provider_scoped() {
        let now = Utc::now();
        let cache = RecommendationCache::new(Duration::minutes(5));
        cache
            .insert(CacheKey::new("EURUSD", "alpha"), sample_recommendation(now))
            .await;

        assert!(cache.get(&CacheKey::new("EURUSD", "beta"), now).await.is_none());
        assert!(cache.get(&CacheKey::new("EURUSD", "alpha"), now).await.is_some());
    }

    #[tokio::test]
    async fn test_population_guard_is_shared_per_key() {
        let cache = RecommendationCache::new(Duration::minutes(5));
        let key = CacheKey::new("EURUSD", "test");
        let a = cache.population_guard(&key).await;
        let b = cache.population_guard(&key).await;
        assert!(Arc::ptr_eq(&a, &b));

        let other = cache.population_guard(&CacheKey::new("GBPUSD", "test")).await;
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn test_cached_value_is_not_mutated_in_place() {
        let now = Utc::now();
        let cache = RecommendationCache::new(Duration::minutes(5));
        let key = CacheKey::new("EURUSD", "test");
        cache.insert(key.clone(), sample_recommendation(now)).await;

        let mut first = cache.get(&key, now).await.unwrap();
        first.confidence = 0.0;
        first.current_price = Decimal::ZERO;

        let second = cache.get(&key, now).await.unwrap();
        assert_eq!(second.confidence, 0.75);
    }
}
