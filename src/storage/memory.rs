//! In-process storage backend.
//!
//! Holds everything in concurrent maps. Not durable; intended for tests and
//! embedded single-process use.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::domain::{SequenceConfig, SequenceCounter};
use crate::error::StorageResult;
use crate::storage::traits::{ConfigStorage, CounterStorage, Storage, UsedIndexStorage};

/// In-memory storage implementation.
#[derive(Default)]
pub struct MemoryStorage {
    counters: DashMap<String, SequenceCounter>,
    configs: DashMap<String, SequenceConfig>,
    used: DashMap<String, BTreeSet<String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStorage for MemoryStorage {
    async fn get_counter(&self, document_type: &str) -> StorageResult<Option<SequenceCounter>> {
        Ok(self.counters.get(document_type).map(|c| c.clone()))
    }

    async fn put_counter(&self, counter: &SequenceCounter) -> StorageResult<()> {
        let mut stored = counter.clone();
        stored.version = counter.version + 1;
        stored.updated_at = Utc::now().timestamp_millis();
        self.counters.insert(stored.document_type.clone(), stored);
        Ok(())
    }

    async fn initialize_counter(&self, document_type: &str, baseline: i64) -> StorageResult<()> {
        self.counters
            .entry(document_type.to_string())
            .or_insert_with(|| SequenceCounter::new(document_type.to_string(), baseline));
        Ok(())
    }
}

#[async_trait]
impl ConfigStorage for MemoryStorage {
    async fn get_config(&self, document_type: &str) -> StorageResult<Option<SequenceConfig>> {
        Ok(self.configs.get(document_type).map(|c| c.clone()))
    }

    async fn save_config(&self, config: &SequenceConfig) -> StorageResult<()> {
        self.configs
            .insert(config.document_type.clone(), config.clone());
        Ok(())
    }

    async fn list_configs(&self) -> StorageResult<Vec<SequenceConfig>> {
        let mut configs: Vec<SequenceConfig> =
            self.configs.iter().map(|e| e.value().clone()).collect();
        configs.sort_by(|a, b| a.document_type.cmp(&b.document_type));
        Ok(configs)
    }

    async fn delete_config(&self, document_type: &str) -> StorageResult<bool> {
        Ok(self.configs.remove(document_type).is_some())
    }
}

#[async_trait]
impl UsedIndexStorage for MemoryStorage {
    async fn contains(&self, document_type: &str, identifier: &str) -> StorageResult<bool> {
        Ok(self
            .used
            .get(document_type)
            .is_some_and(|set| set.contains(identifier)))
    }

    async fn insert_if_absent(
        &self,
        document_type: &str,
        identifier: &str,
    ) -> StorageResult<bool> {
        // The entry guard holds the shard lock, so check-and-insert is atomic.
        let mut set = self.used.entry(document_type.to_string()).or_default();
        Ok(set.insert(identifier.to_string()))
    }

    async fn remove(&self, document_type: &str, identifier: &str) -> StorageResult<bool> {
        Ok(self
            .used
            .get_mut(document_type)
            .is_some_and(|mut set| set.remove(identifier)))
    }

    async fn count(&self, document_type: &str) -> StorageResult<u64> {
        Ok(self
            .used
            .get(document_type)
            .map_or(0, |set| set.len() as u64))
    }

    async fn clear(&self, document_type: &str) -> StorageResult<()> {
        self.used.remove(document_type);
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
