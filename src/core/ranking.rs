//! Top-context ranking across heterogeneous record stores.
//!
//! Each requested type is fetched concurrently (newest first, bounded),
//! every record is scored, and the merged list is sorted by score and
//! truncated to the requested size.

use crate::config::{CandidatePool, ConfigError, RankingConfig};
use crate::core::items::{ContextItem, ContextType};
use crate::core::scoring::{to_item, Scorable, ScoringPolicy};
use crate::store::{RecordStore, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// A source type whose query failed during one ranking pass.
#[derive(Debug)]
pub struct SourceFailure {
    pub context_type: ContextType,
    pub error: StoreError,
}

/// Result of one ranking pass.
#[derive(Debug, Serialize)]
pub struct RankedContext {
    /// Items in rank order, first = most relevant
    pub items: Vec<ContextItem>,
    /// Types whose store could not be queried and were left out
    pub degraded: Vec<ContextType>,
}

/// Ranking errors.
#[derive(Debug)]
pub enum RankingError {
    /// Every requested source failed, so there is nothing meaningful to rank
    AllSourcesFailed(Vec<SourceFailure>),
}

impl std::fmt::Display for RankingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankingError::AllSourcesFailed(failures) => {
                write!(f, "All context sources failed:")?;
                for failure in failures {
                    write!(f, " [{}: {}]", failure.context_type, failure.error)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for RankingError {}

/// Produces a bounded, score-ordered feed of recent context items.
pub struct TopContextGetter {
    store: Arc<dyn RecordStore>,
    policy: ScoringPolicy,
    candidate_pool: CandidatePool,
    default_limit: usize,
}

impl TopContextGetter {
    /// Create a ranker with the default policy.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let config = RankingConfig::default();
        Self {
            store,
            policy: ScoringPolicy::default(),
            candidate_pool: config.candidate_pool,
            default_limit: config.default_limit,
        }
    }

    /// Create a ranker from ranking configuration, rejecting a policy
    /// that cannot produce finite scores.
    pub fn from_config(
        store: Arc<dyn RecordStore>,
        config: &RankingConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            policy: ScoringPolicy::try_from(config)?,
            candidate_pool: config.candidate_pool,
            default_limit: config.default_limit,
        })
    }

    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_candidate_pool(mut self, pool: CandidatePool) -> Self {
        self.candidate_pool = pool;
        self
    }

    /// Result size used when a caller gives none.
    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Top `limit` items across `types` (all producer-backed types when
    /// empty), ranked at the current time.
    pub async fn get_top_context(
        &self,
        limit: usize,
        types: &[ContextType],
    ) -> Result<Vec<ContextItem>, RankingError> {
        self.get_top_context_at(Utc::now(), limit, types).await
    }

    /// Same as [`get_top_context`](Self::get_top_context) with an explicit clock.
    pub async fn get_top_context_at(
        &self,
        now: DateTime<Utc>,
        limit: usize,
        types: &[ContextType],
    ) -> Result<Vec<ContextItem>, RankingError> {
        Ok(self.rank_at(now, limit, types).await?.items)
    }

    /// Rank and report which sources were left out.
    pub async fn rank(
        &self,
        limit: usize,
        types: &[ContextType],
    ) -> Result<RankedContext, RankingError> {
        self.rank_at(Utc::now(), limit, types).await
    }

    pub async fn rank_at(
        &self,
        now: DateTime<Utc>,
        limit: usize,
        types: &[ContextType],
    ) -> Result<RankedContext, RankingError> {
        let requested = requested_sources(types);
        if limit == 0 || requested.is_empty() {
            return Ok(RankedContext {
                items: Vec::new(),
                degraded: Vec::new(),
            });
        }

        let fetch_limit = match self.candidate_pool {
            CandidatePool::PerTypeLimit => limit,
            CandidatePool::Expanded => limit.saturating_mul(requested.len()),
        };
        let wants = |ty: ContextType| requested.contains(&ty);

        // Stores have no data dependency on each other; query them together.
        let (browser, communication, insight, learning) = tokio::join!(
            async {
                if wants(ContextType::Browser) {
                    Some(self.store.recent_browser_history(fetch_limit).await)
                } else {
                    None
                }
            },
            async {
                if wants(ContextType::Communication) {
                    Some(self.store.recent_communications(fetch_limit).await)
                } else {
                    None
                }
            },
            async {
                if wants(ContextType::Insight) {
                    Some(self.store.recent_insights(fetch_limit).await)
                } else {
                    None
                }
            },
            async {
                if wants(ContextType::Learning) {
                    Some(self.store.recent_learning_events(fetch_limit).await)
                } else {
                    None
                }
            },
        );

        // Items are appended in fetch order; the stable sort below keeps
        // that order for equal scores.
        let mut items = Vec::new();
        let mut failures = Vec::new();
        self.collect(ContextType::Browser, browser, now, &mut items, &mut failures);
        self.collect(ContextType::Communication, communication, now, &mut items, &mut failures);
        self.collect(ContextType::Insight, insight, now, &mut items, &mut failures);
        self.collect(ContextType::Learning, learning, now, &mut items, &mut failures);

        if failures.len() == requested.len() {
            return Err(RankingError::AllSourcesFailed(failures));
        }

        let candidates = items.len();
        items.sort_by(|a, b| b.score.total_cmp(&a.score));
        items.truncate(limit);

        debug!(
            "Ranked {} of {} candidates from {} source(s), {} degraded",
            items.len(),
            candidates,
            requested.len(),
            failures.len()
        );

        Ok(RankedContext {
            items,
            degraded: failures.iter().map(|f| f.context_type).collect(),
        })
    }

    fn collect<R: Scorable>(
        &self,
        context_type: ContextType,
        fetched: Option<Result<Vec<R>, StoreError>>,
        now: DateTime<Utc>,
        items: &mut Vec<ContextItem>,
        failures: &mut Vec<SourceFailure>,
    ) {
        match fetched {
            Some(Ok(records)) => {
                items.extend(records.iter().map(|r| to_item(r, now, &self.policy)));
            }
            Some(Err(error)) => {
                warn!("Skipping {} context: {}", context_type, error);
                failures.push(SourceFailure {
                    context_type,
                    error,
                });
            }
            None => {}
        }
    }
}

/// Producer-backed types to query, in fixed fetch order.
fn requested_sources(types: &[ContextType]) -> Vec<ContextType> {
    if types.is_empty() {
        return ContextType::PRODUCERS.to_vec();
    }
    ContextType::PRODUCERS
        .into_iter()
        .filter(|ty| types.contains(ty))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        BrowserHistory, Communication, Insight, LearningEvent, MemoryStore, StoreError,
    };
    use async_trait::async_trait;
    use chrono::Duration;

    const EPS: f64 = 1e-9;

    /// Store whose insight and learning collections are unreachable.
    struct FlakyStore {
        inner: MemoryStore,
        fail_all: bool,
    }

    #[async_trait]
    impl RecordStore for FlakyStore {
        async fn recent_browser_history(
            &self,
            limit: usize,
        ) -> Result<Vec<BrowserHistory>, StoreError> {
            if self.fail_all {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            self.inner.recent_browser_history(limit).await
        }

        async fn recent_communications(
            &self,
            limit: usize,
        ) -> Result<Vec<Communication>, StoreError> {
            if self.fail_all {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            self.inner.recent_communications(limit).await
        }

        async fn recent_insights(&self, _limit: usize) -> Result<Vec<Insight>, StoreError> {
            Err(StoreError::Query {
                collection: "insights".to_string(),
                message: "timeout".to_string(),
            })
        }

        async fn recent_learning_events(
            &self,
            _limit: usize,
        ) -> Result<Vec<LearningEvent>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    fn populated_store(now: DateTime<Utc>) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_browser_history(BrowserHistory::new(
                "https://news.example",
                Some("Morning news"),
                now - Duration::minutes(10),
            ))
            .unwrap();
        store
            .insert_communication(Communication::new(
                "email",
                "airline@carrier.test",
                "me",
                "Your flight booking is confirmed",
                now - Duration::minutes(120),
            ))
            .unwrap();
        store
            .insert_insight(Insight::new(
                "habit",
                "heating",
                "thermostat lowered every night",
                0.3,
                now - Duration::minutes(60),
            ))
            .unwrap();
        store
            .insert_learning_event(LearningEvent::new("scene_activated", now))
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_golden_ordering() {
        let now = Utc::now();
        let tcg = TopContextGetter::new(Arc::new(populated_store(now)));

        let items = tcg.get_top_context_at(now, 20, &[]).await.unwrap();
        let types: Vec<ContextType> = items.iter().map(|i| i.item_type).collect();

        // learning 1.0, browser 2^(-1/6), communication 0.25 + 0.4, insight 0.5 + 0.3
        assert_eq!(
            types,
            vec![
                ContextType::Learning,
                ContextType::Browser,
                ContextType::Insight,
                ContextType::Communication,
            ]
        );
        assert!((items[0].score - 1.0).abs() < EPS);
        assert!((items[1].score - 2f64.powf(-1.0 / 6.0)).abs() < EPS);
        assert!((items[2].score - 0.8).abs() < EPS);
        assert!((items[3].score - 0.65).abs() < EPS);
    }

    #[tokio::test]
    async fn test_limit_and_sortedness() {
        let now = Utc::now();
        let store = MemoryStore::new();
        for i in 0..15 {
            store
                .insert_learning_event(LearningEvent::new(
                    format!("event {i}"),
                    now - Duration::minutes(i * 7),
                ))
                .unwrap();
            store
                .insert_browser_history(BrowserHistory::new(
                    format!("https://site{i}.test"),
                    Some("page"),
                    now - Duration::minutes(i * 11),
                ))
                .unwrap();
        }
        let tcg = TopContextGetter::new(Arc::new(store));

        for limit in [1, 5, 10, 40] {
            let items = tcg.get_top_context_at(now, limit, &[]).await.unwrap();
            assert!(items.len() <= limit);
            assert!(items.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }

    #[tokio::test]
    async fn test_zero_limit_and_device_only_are_empty() {
        let now = Utc::now();
        let tcg = TopContextGetter::new(Arc::new(populated_store(now)));

        assert!(tcg.get_top_context_at(now, 0, &[]).await.unwrap().is_empty());
        assert!(tcg
            .get_top_context_at(now, 10, &[ContextType::Device])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_type_filter() {
        let now = Utc::now();
        let tcg = TopContextGetter::new(Arc::new(populated_store(now)));

        let items = tcg
            .get_top_context_at(now, 10, &[ContextType::Insight, ContextType::Device])
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_type, ContextType::Insight);
    }

    #[tokio::test]
    async fn test_ties_follow_fetch_order() {
        let now = Utc::now();
        let store = MemoryStore::new();
        store
            .insert_learning_event(LearningEvent::new("learned", now))
            .unwrap();
        store
            .insert_communication(Communication::new("sms", "a", "b", "hi", now))
            .unwrap();
        store
            .insert_browser_history(BrowserHistory::new("https://x.test", Some("x"), now))
            .unwrap();
        let tcg = TopContextGetter::new(Arc::new(store));

        let items = tcg.get_top_context_at(now, 10, &[]).await.unwrap();
        let types: Vec<ContextType> = items.iter().map(|i| i.item_type).collect();
        assert_eq!(
            types,
            vec![
                ContextType::Browser,
                ContextType::Communication,
                ContextType::Learning
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_sources_degrade_gracefully() {
        let now = Utc::now();
        let store = FlakyStore {
            inner: populated_store(now),
            fail_all: false,
        };
        let tcg = TopContextGetter::new(Arc::new(store));

        let ranked = tcg.rank_at(now, 10, &[]).await.unwrap();
        assert_eq!(ranked.items.len(), 2);
        assert_eq!(
            ranked.degraded,
            vec![ContextType::Insight, ContextType::Learning]
        );
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_an_error() {
        let now = Utc::now();
        let store = FlakyStore {
            inner: MemoryStore::new(),
            fail_all: true,
        };
        let tcg = TopContextGetter::new(Arc::new(store));

        let err = tcg.get_top_context_at(now, 10, &[]).await.unwrap_err();
        let RankingError::AllSourcesFailed(failures) = err;
        assert_eq!(failures.len(), 4);

        // Only the requested sources count
        let err = tcg
            .get_top_context_at(now, 10, &[ContextType::Learning])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("learning"));
    }

    #[tokio::test]
    async fn test_expanded_pool_finds_older_critical_items() {
        let now = Utc::now();
        let store = MemoryStore::new();
        // Two fresh, unremarkable browser visits and one older critical one.
        store
            .insert_browser_history(BrowserHistory::new(
                "https://a.test",
                Some("recipes"),
                now,
            ))
            .unwrap();
        store
            .insert_browser_history(BrowserHistory::new(
                "https://b.test",
                Some("weather"),
                now - Duration::minutes(1),
            ))
            .unwrap();
        store
            .insert_browser_history(BrowserHistory::new(
                "https://c.test",
                Some("visa appointment booking deadline"),
                now - Duration::minutes(30),
            ))
            .unwrap();
        let store = Arc::new(store);

        let approx = TopContextGetter::new(store.clone());
        let items = approx
            .get_top_context_at(now, 2, &[ContextType::Browser, ContextType::Learning])
            .await
            .unwrap();
        assert_eq!(items[0].title, "Visited: recipes");
        assert_eq!(items[1].title, "Visited: weather");

        let exact = TopContextGetter::new(store).with_candidate_pool(CandidatePool::Expanded);
        let items = exact
            .get_top_context_at(now, 2, &[ContextType::Browser, ContextType::Learning])
            .await
            .unwrap();
        assert_eq!(items[0].title, "Visited: visa appointment booking deadline");
    }

    #[test]
    fn test_requested_sources_order_is_fixed() {
        assert_eq!(
            requested_sources(&[ContextType::Learning, ContextType::Browser]),
            vec![ContextType::Browser, ContextType::Learning]
        );
        assert_eq!(requested_sources(&[]).len(), 4);
        assert!(requested_sources(&[ContextType::Device]).is_empty());
    }

    #[test]
    fn test_from_config_rejects_zero_half_life() {
        let config = RankingConfig {
            half_life_minutes: 0.0,
            ..RankingConfig::default()
        };
        assert!(TopContextGetter::from_config(Arc::new(MemoryStore::new()), &config).is_err());
    }

    #[tokio::test]
    async fn test_short_half_life_keeps_fresh_items_on_top() {
        let now = Utc::now();
        let store = MemoryStore::new();
        store
            .insert_learning_event(LearningEvent::new("old emergency", now - Duration::days(30)))
            .unwrap();
        store
            .insert_learning_event(LearningEvent::new("fresh", now))
            .unwrap();

        let policy = ScoringPolicy::new(0.001, 0.2, 0.8, ["emergency"]).unwrap();
        let tcg = TopContextGetter::new(Arc::new(store)).with_policy(policy);

        let items = tcg.get_top_context_at(now, 10, &[]).await.unwrap();
        assert_eq!(items[0].title, "Learning: fresh");
        assert_eq!(items[0].score, 1.0);
        assert!((items[1].score - 0.2).abs() < EPS);
        assert!(items.iter().all(|i| i.score.is_finite()));
    }
}
