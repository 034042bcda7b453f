//! Core ranking functionality.
//!
//! This module contains:
//! - Context item types
//! - Recency and criticality scoring
//! - The top-context ranker

pub mod items;
pub mod ranking;
pub mod scoring;

// Re-export commonly used types
pub use items::{ContextItem, ContextType};
pub use ranking::{RankedContext, RankingError, SourceFailure, TopContextGetter};
pub use scoring::{
    criticality_boost, recency_score, score_breakdown, ScoreBreakdown, Scorable, ScoringPolicy,
    CRITICAL_KEYWORDS,
};
