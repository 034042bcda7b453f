//! Source records owned by the persistence layer.
//!
//! The context service only reads these; it never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A visited page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserHistory {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Time spent on the page, in seconds
    #[serde(default)]
    pub duration: Option<u64>,
    pub visited_at: DateTime<Utc>,
}

impl BrowserHistory {
    pub fn new(url: impl Into<String>, title: Option<&str>, visited_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            title: title.map(str::to_string),
            tags: Vec::new(),
            duration: None,
            visited_at,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// A message sent or received (email, sms, chat).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Communication {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sender: String,
    pub recipient: String,
    pub content: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl Communication {
    pub fn new(
        kind: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: kind.into(),
            sender: sender.into(),
            recipient: recipient.into(),
            content: content.into(),
            status: "received".to_string(),
            timestamp,
        }
    }
}

/// An insight produced by an upstream generation process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub context: String,
    pub content: String,
    pub confidence: f64,
    /// Precomputed relevance, added to the score as-is
    pub relevance: f64,
    pub generated_at: DateTime<Utc>,
}

impl Insight {
    pub fn new(
        kind: impl Into<String>,
        context: impl Into<String>,
        content: impl Into<String>,
        relevance: f64,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: kind.into(),
            context: context.into(),
            content: content.into(),
            confidence: 1.0,
            relevance,
            generated_at,
        }
    }
}

/// A learning/usage event recorded by the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningEvent {
    pub id: String,
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl LearningEvent {
    pub fn new(event: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event: event.into(),
            data: serde_json::Value::Null,
            timestamp,
        }
    }
}

/// All four collections, as stored in a JSON dataset file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub browser_history: Vec<BrowserHistory>,
    #[serde(default)]
    pub communications: Vec<Communication>,
    #[serde(default)]
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub learning_events: Vec<LearningEvent>,
}

impl Dataset {
    /// Total number of records across all collections.
    pub fn len(&self) -> usize {
        self.browser_history.len()
            + self.communications.len()
            + self.insights.len()
            + self.learning_events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A small household dataset relative to `now`, for demos and smoke tests.
    pub fn sample(now: DateTime<Utc>) -> Self {
        use chrono::Duration;

        Self {
            browser_history: vec![
                BrowserHistory::new(
                    "https://airline.example/checkin",
                    Some("Online check-in"),
                    now - Duration::minutes(12),
                )
                .with_tags(&["travel", "flight"]),
                BrowserHistory::new(
                    "https://recipes.example/lasagna",
                    Some("Weeknight lasagna"),
                    now - Duration::minutes(95),
                ),
            ],
            communications: vec![
                Communication::new(
                    "email",
                    "school@district.example",
                    "parent@home.example",
                    "Reminder: maths exam moved to Thursday",
                    now - Duration::minutes(40),
                ),
                Communication::new(
                    "sms",
                    "Sam",
                    "me",
                    "Running late, start dinner without me",
                    now - Duration::minutes(5),
                ),
            ],
            insights: vec![Insight::new(
                "energy",
                "household budget",
                "Heating costs are 18% above last month",
                0.4,
                now - Duration::minutes(180),
            )],
            learning_events: vec![
                LearningEvent::new("evening_scene_activated", now - Duration::minutes(2)),
                LearningEvent::new("thermostat_manual_override", now - Duration::minutes(70)),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_json_uses_camel_case() {
        let dataset = Dataset::sample(Utc::now());
        assert_eq!(dataset.len(), 7);

        let json = serde_json::to_value(&dataset).unwrap();
        assert!(json["browserHistory"][0]["visitedAt"].is_string());
        assert!(json["insights"][0]["generatedAt"].is_string());
        assert_eq!(json["communications"][0]["type"], "email");
    }

    #[test]
    fn test_dataset_tolerates_missing_collections() {
        let dataset: Dataset = serde_json::from_str(
            r#"{"learningEvents":[{"id":"l1","event":"x","timestamp":"2024-05-01T10:00:00Z"}]}"#,
        )
        .unwrap();
        assert_eq!(dataset.len(), 1);
        assert!(dataset.learning_events[0].data.is_null());
    }
}
