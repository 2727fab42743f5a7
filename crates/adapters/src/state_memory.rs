//! In-memory post store for tests and embedding

use async_trait::async_trait;
use rss_relay_domain::{PostRecord, PostStore, StateError};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory post store implementation
pub struct InMemoryPostStore {
    records: RwLock<HashMap<String, PostRecord>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryPostStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn get(&self, link: &str) -> Result<Option<PostRecord>, StateError> {
        let records = self
            .records
            .read()
            .map_err(|e| StateError::Database(e.to_string()))?;
        Ok(records.get(link).cloned())
    }

    async fn upsert(&self, record: &PostRecord) -> Result<(), StateError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StateError::Database(e.to_string()))?;
        records.insert(record.link.clone(), record.clone());
        Ok(())
    }
}
