//! Read-only query interface over the record collections.
//!
//! The ranker only ever asks each collection for its most recent records,
//! newest first, bounded by a count. Filtering, joins and paging belong to
//! the persistence layer.

pub mod memory;
pub mod records;

pub use memory::MemoryStore;
pub use records::{BrowserHistory, Communication, Dataset, Insight, LearningEvent};

use async_trait::async_trait;

/// Recency-ordered access to the four record collections.
///
/// Every method returns at most `limit` records ordered by the collection's
/// own recency field, descending.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Browsing history ordered by `visited_at`.
    async fn recent_browser_history(&self, limit: usize)
        -> Result<Vec<BrowserHistory>, StoreError>;

    /// Communications ordered by `timestamp`.
    async fn recent_communications(&self, limit: usize) -> Result<Vec<Communication>, StoreError>;

    /// Insights ordered by `generated_at`.
    async fn recent_insights(&self, limit: usize) -> Result<Vec<Insight>, StoreError>;

    /// Learning events ordered by `timestamp`.
    async fn recent_learning_events(&self, limit: usize)
        -> Result<Vec<LearningEvent>, StoreError>;
}

/// Store errors.
#[derive(Debug)]
pub enum StoreError {
    /// The backing storage could not be reached
    Unavailable(String),
    /// A query against one collection failed
    Query { collection: String, message: String },
    /// Dataset file could not be read or written
    Io(String),
    /// Dataset file could not be (de)serialized
    Serialization(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {msg}"),
            StoreError::Query {
                collection,
                message,
            } => write!(f, "Query on {collection} failed: {message}"),
            StoreError::Io(msg) => write!(f, "Store IO error: {msg}"),
            StoreError::Serialization(msg) => write!(f, "Store serialization error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}
