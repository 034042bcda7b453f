//! Context item scoring.
//!
//! ```text
//! score = recency + criticality (+ relevance, insights only)
//!
//! recency     = exp(-ln(2) / halfLife * ageMinutes)     age clamped at 0
//! criticality = min(keywordBoost * matchedKeywords, keywordBoostCap)
//! ```
//!
//! The final sum is not normalized; scores are only comparable within one
//! ranking pass.

use crate::config::{ConfigError, RankingConfig};
use crate::core::items::{ContextItem, ContextType};
use crate::store::{BrowserHistory, Communication, Insight, LearningEvent};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Keywords that mark an item as critical regardless of its age.
pub const CRITICAL_KEYWORDS: [&str; 11] = [
    "allergy",
    "emergency",
    "deadline",
    "budget",
    "finance",
    "meeting",
    "exam",
    "appointment",
    "booking",
    "flight",
    "visa",
];

/// Default recency half-life in minutes.
pub const DEFAULT_HALF_LIFE_MINUTES: f64 = 60.0;

/// Default score added per matched keyword.
pub const DEFAULT_KEYWORD_BOOST: f64 = 0.2;

/// Default cap on the summed keyword boost.
pub const DEFAULT_KEYWORD_BOOST_CAP: f64 = 0.8;

/// Tunable scoring parameters.
///
/// Only constructed through [`ScoringPolicy::new`] (or from a
/// [`RankingConfig`]), so a policy always has a positive finite half-life
/// and non-negative finite boosts.
#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    half_life_minutes: f64,
    keyword_boost: f64,
    keyword_boost_cap: f64,
    /// Lower-cased keywords
    keywords: Vec<String>,
}

impl ScoringPolicy {
    pub fn new<I, K>(
        half_life_minutes: f64,
        keyword_boost: f64,
        keyword_boost_cap: f64,
        keywords: I,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        if !(half_life_minutes.is_finite() && half_life_minutes > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "half_life_minutes must be positive, got {half_life_minutes}"
            )));
        }
        for (name, value) in [
            ("keyword_boost", keyword_boost),
            ("keyword_boost_cap", keyword_boost_cap),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        Ok(Self {
            half_life_minutes,
            keyword_boost,
            keyword_boost_cap,
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        })
    }

    pub fn half_life_minutes(&self) -> f64 {
        self.half_life_minutes
    }

    pub fn keyword_boost(&self) -> f64 {
        self.keyword_boost
    }

    pub fn keyword_boost_cap(&self) -> f64 {
        self.keyword_boost_cap
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            half_life_minutes: DEFAULT_HALF_LIFE_MINUTES,
            keyword_boost: DEFAULT_KEYWORD_BOOST,
            keyword_boost_cap: DEFAULT_KEYWORD_BOOST_CAP,
            keywords: CRITICAL_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl TryFrom<&RankingConfig> for ScoringPolicy {
    type Error = ConfigError;

    fn try_from(config: &RankingConfig) -> Result<Self, Self::Error> {
        Self::new(
            config.half_life_minutes,
            config.keyword_boost,
            config.keyword_boost_cap,
            &config.keywords,
        )
    }
}

/// Exponential recency decay. 1.0 at age 0, 0.5 at one half-life.
pub fn recency_score(age_minutes: f64, half_life_minutes: f64) -> f64 {
    let age = age_minutes.max(0.0);
    (-std::f64::consts::LN_2 / half_life_minutes * age).exp()
}

/// Age of an event in minutes; events in the future count as age 0.
pub fn age_minutes(now: DateTime<Utc>, at: DateTime<Utc>) -> f64 {
    ((now - at).num_milliseconds() as f64 / 60_000.0).max(0.0)
}

/// Keyword boost for a piece of text. Each distinct keyword counts once.
pub fn criticality_boost(text: &str, policy: &ScoringPolicy) -> f64 {
    let text = text.to_lowercase();
    let matches = policy
        .keywords
        .iter()
        .filter(|k| !k.is_empty() && text.contains(k.as_str()))
        .count();
    (matches as f64 * policy.keyword_boost).min(policy.keyword_boost_cap)
}

/// A source record that can be turned into a ranked [`ContextItem`].
pub trait Scorable: Serialize {
    fn context_type(&self) -> ContextType;
    fn record_id(&self) -> &str;
    /// Time of the originating event
    fn occurred_at(&self) -> DateTime<Utc>;
    /// Text scanned for critical keywords
    fn boost_text(&self) -> String;
    /// Human-readable synopsis
    fn synopsis(&self) -> String;
    /// Source-specific additive relevance
    fn relevance(&self) -> f64 {
        0.0
    }
}

/// Per-factor view of a score, for debugging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub recency: f64,
    pub criticality: f64,
    pub relevance: f64,
    pub total: f64,
}

/// Score a record at `now`.
pub fn score_breakdown<R: Scorable>(
    record: &R,
    now: DateTime<Utc>,
    policy: &ScoringPolicy,
) -> ScoreBreakdown {
    let recency = recency_score(
        age_minutes(now, record.occurred_at()),
        policy.half_life_minutes,
    );
    let criticality = criticality_boost(&record.boost_text(), policy);
    let relevance = record.relevance();

    ScoreBreakdown {
        recency,
        criticality,
        relevance,
        total: recency + criticality + relevance,
    }
}

/// Build a ranked item from a record.
pub fn to_item<R: Scorable>(record: &R, now: DateTime<Utc>, policy: &ScoringPolicy) -> ContextItem {
    ContextItem {
        id: record.record_id().to_string(),
        item_type: record.context_type(),
        title: record.synopsis(),
        timestamp: record.occurred_at(),
        score: score_breakdown(record, now, policy).total,
        data: serde_json::to_value(record).unwrap_or_default(),
    }
}

impl Scorable for BrowserHistory {
    fn context_type(&self) -> ContextType {
        ContextType::Browser
    }

    fn record_id(&self) -> &str {
        &self.id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.visited_at
    }

    fn boost_text(&self) -> String {
        format!("{} {}", self.title.as_deref().unwrap_or(""), self.tags.join(" "))
    }

    fn synopsis(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => format!("Visited: {title}"),
            _ => format!("Visited: {}", self.url),
        }
    }
}

impl Scorable for Communication {
    fn context_type(&self) -> ContextType {
        ContextType::Communication
    }

    fn record_id(&self) -> &str {
        &self.id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn boost_text(&self) -> String {
        format!("{} {} {}", self.sender, self.recipient, self.content)
    }

    fn synopsis(&self) -> String {
        format!("{} from {} to {}", self.kind, self.sender, self.recipient)
    }
}

impl Scorable for Insight {
    fn context_type(&self) -> ContextType {
        ContextType::Insight
    }

    fn record_id(&self) -> &str {
        &self.id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    fn boost_text(&self) -> String {
        format!("{} {}", self.context, self.content)
    }

    fn synopsis(&self) -> String {
        format!("Insight ({}): {}", self.kind, self.context)
    }

    // NaN or infinite relevance from upstream would poison the sort.
    fn relevance(&self) -> f64 {
        if self.relevance.is_finite() {
            self.relevance
        } else {
            0.0
        }
    }
}

impl Scorable for LearningEvent {
    fn context_type(&self) -> ContextType {
        ContextType::Learning
    }

    fn record_id(&self) -> &str {
        &self.id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn boost_text(&self) -> String {
        self.event.clone()
    }

    fn synopsis(&self) -> String {
        format!("Learning: {}", self.event)
    }
}
