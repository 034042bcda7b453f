//! Ranked context items.
//!
//! A [`ContextItem`] is built per request from one source record and never
//! persisted. Items from different source types are comparable only through
//! their `score`.

use crate::ambient::ContextError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Closed set of context item types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    Browser,
    Communication,
    Insight,
    Learning,
    /// Reserved; no source produces device items yet.
    Device,
}

impl ContextType {
    /// Producer-backed types in fetch order. This order is also the
    /// tie-break order for equal scores.
    pub const PRODUCERS: [ContextType; 4] = [
        ContextType::Browser,
        ContextType::Communication,
        ContextType::Insight,
        ContextType::Learning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextType::Browser => "browser",
            ContextType::Communication => "communication",
            ContextType::Insight => "insight",
            ContextType::Learning => "learning",
            ContextType::Device => "device",
        }
    }
}

impl std::fmt::Display for ContextType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ContextType {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "browser" => Ok(ContextType::Browser),
            "communication" => Ok(ContextType::Communication),
            "insight" => Ok(ContextType::Insight),
            "learning" => Ok(ContextType::Learning),
            "device" => Ok(ContextType::Device),
            other => Err(ContextError::InvalidType(other.to_string())),
        }
    }
}

/// One ranked, typed, timestamped fact drawn from a source record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    /// Identifier of the originating record
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ContextType,
    /// Human-readable synopsis
    pub title: String,
    /// Time of the originating event
    pub timestamp: DateTime<Utc>,
    /// Rank within one ranking pass; not on a fixed scale
    pub score: f64,
    /// Source-specific payload
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_type_parsing() {
        assert_eq!("Browser".parse::<ContextType>().unwrap(), ContextType::Browser);
        assert_eq!(" device ".parse::<ContextType>().unwrap(), ContextType::Device);
        assert!(matches!(
            "calendar".parse::<ContextType>(),
            Err(ContextError::InvalidType(_))
        ));
    }

    #[test]
    fn test_device_has_no_producer() {
        assert!(!ContextType::PRODUCERS.contains(&ContextType::Device));
    }

    #[test]
    fn test_item_serializes_type_tag() {
        let item = ContextItem {
            id: "b1".to_string(),
            item_type: ContextType::Communication,
            title: "Message from Ana".to_string(),
            timestamp: Utc::now(),
            score: 1.0,
            data: serde_json::json!({}),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "communication");
        assert!(json["timestamp"].as_str().is_some());
    }
}
