//! In-memory record store, optionally loaded from a JSON dataset file.

use super::records::{BrowserHistory, Communication, Dataset, Insight, LearningEvent};
use super::{RecordStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::RwLock;

/// Thread-safe in-memory store over the four collections.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Dataset>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given dataset.
    pub fn from_dataset(dataset: Dataset) -> Self {
        Self {
            data: RwLock::new(dataset),
        }
    }

    /// Load a dataset file. A missing file yields an empty store.
    pub fn load_json(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            tracing::debug!("No dataset at {:?}, starting empty", path);
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::Io(e.to_string()))?;
        let dataset: Dataset = serde_json::from_str(&content)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tracing::info!("Loaded {} records from {:?}", dataset.len(), path);
        Ok(Self::from_dataset(dataset))
    }

    /// Write the current dataset to a file.
    pub fn save_json(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let json = {
            let data = self.read()?;
            serde_json::to_string_pretty(&*data)
                .map_err(|e| StoreError::Serialization(e.to_string()))?
        };
        std::fs::write(path, json).map_err(|e| StoreError::Io(e.to_string()))
    }

    pub fn insert_browser_history(&self, record: BrowserHistory) -> Result<(), StoreError> {
        self.write()?.browser_history.push(record);
        Ok(())
    }

    pub fn insert_communication(&self, record: Communication) -> Result<(), StoreError> {
        self.write()?.communications.push(record);
        Ok(())
    }

    pub fn insert_insight(&self, record: Insight) -> Result<(), StoreError> {
        self.write()?.insights.push(record);
        Ok(())
    }

    pub fn insert_learning_event(&self, record: LearningEvent) -> Result<(), StoreError> {
        self.write()?.learning_events.push(record);
        Ok(())
    }

    /// Total number of stored records.
    pub fn len(&self) -> usize {
        self.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Dataset>, StoreError> {
        self.data
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Dataset>, StoreError> {
        self.data
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

/// Newest-first copy of up to `limit` records.
fn most_recent<T: Clone>(records: &[T], limit: usize, at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = records.to_vec();
    out.sort_by_key(|r| std::cmp::Reverse(at(r)));
    out.truncate(limit);
    out
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn recent_browser_history(
        &self,
        limit: usize,
    ) -> Result<Vec<BrowserHistory>, StoreError> {
        Ok(most_recent(&self.read()?.browser_history, limit, |r| r.visited_at))
    }

    async fn recent_communications(&self, limit: usize) -> Result<Vec<Communication>, StoreError> {
        Ok(most_recent(&self.read()?.communications, limit, |r| r.timestamp))
    }

    async fn recent_insights(&self, limit: usize) -> Result<Vec<Insight>, StoreError> {
        Ok(most_recent(&self.read()?.insights, limit, |r| r.generated_at))
    }

    async fn recent_learning_events(
        &self,
        limit: usize,
    ) -> Result<Vec<LearningEvent>, StoreError> {
        Ok(most_recent(&self.read()?.learning_events, limit, |r| r.timestamp))
    }
}
