//! File-based storage backend.
//!
//! This backend stores data as JSON files with file locking for atomic operations.
//! Suitable for development and single-node deployments.
//!
//! Directory structure:
//! ```text
//! data/
//! ├── counters/
//! │   └── {document_type}.json
//! ├── configs/
//! │   └── {document_type}.json
//! └── used/
//!     └── {document_type}.json
//! ```

mod config;
mod counter;
mod used;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::FileStorageConfig;
use crate::domain::{SequenceConfig, SequenceCounter};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{ConfigStorage, CounterStorage, Storage, UsedIndexStorage};

pub use config::FileConfigStorage;
pub use counter::FileCounterStorage;
pub use used::FileUsedIndex;

/// File-based storage implementation.
pub struct FileStorage {
    /// Base data directory.
    base_dir: PathBuf,
    /// Counter storage.
    counter_storage: FileCounterStorage,
    /// Config storage.
    config_storage: FileConfigStorage,
    /// Used-identifier index.
    used_index: FileUsedIndex,
}

impl FileStorage {
    /// Create a new file storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directories cannot be created.
    pub fn new(config: &FileStorageConfig) -> StorageResult<Self> {
        let base_dir = config.data_dir.clone();

        Self::ensure_directories(&base_dir)?;

        Ok(Self {
            counter_storage: FileCounterStorage::new(base_dir.join("counters")),
            config_storage: FileConfigStorage::new(base_dir.join("configs")),
            used_index: FileUsedIndex::new(base_dir.join("used")),
            base_dir,
        })
    }

    /// Ensure all required directories exist.
    fn ensure_directories(base_dir: &Path) -> StorageResult<()> {
        let dirs = [
            base_dir.to_path_buf(),
            base_dir.join("counters"),
            base_dir.join("configs"),
            base_dir.join("used"),
        ];

        for dir in &dirs {
            std::fs::create_dir_all(dir).map_err(|e| {
                StorageError::FileIO(format!("Failed to create directory {dir:?}: {e}"))
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl CounterStorage for FileStorage {
    async fn get_counter(&self, document_type: &str) -> StorageResult<Option<SequenceCounter>> {
        self.counter_storage.get_counter(document_type).await
    }

    async fn put_counter(&self, counter: &SequenceCounter) -> StorageResult<()> {
        self.counter_storage.put_counter(counter).await
    }

    async fn initialize_counter(&self, document_type: &str, baseline: i64) -> StorageResult<()> {
        self.counter_storage
            .initialize_counter(document_type, baseline)
            .await
    }
}

#[async_trait]
impl ConfigStorage for FileStorage {
    async fn get_config(&self, document_type: &str) -> StorageResult<Option<SequenceConfig>> {
        self.config_storage.get_config(document_type).await
    }

    async fn save_config(&self, config: &SequenceConfig) -> StorageResult<()> {
        self.config_storage.save_config(config).await
    }

    async fn list_configs(&self) -> StorageResult<Vec<SequenceConfig>> {
        self.config_storage.list_configs().await
    }

    async fn delete_config(&self, document_type: &str) -> StorageResult<bool> {
        self.config_storage.delete_config(document_type).await
    }
}

#[async_trait]
impl UsedIndexStorage for FileStorage {
    async fn contains(&self, document_type: &str, identifier: &str) -> StorageResult<bool> {
        self.used_index.contains(document_type, identifier).await
    }

    async fn insert_if_absent(
        &self,
        document_type: &str,
        identifier: &str,
    ) -> StorageResult<bool> {
        self.used_index
            .insert_if_absent(document_type, identifier)
            .await
    }

    async fn remove(&self, document_type: &str, identifier: &str) -> StorageResult<bool> {
        self.used_index.remove(document_type, identifier).await
    }

    async fn count(&self, document_type: &str) -> StorageResult<u64> {
        self.used_index.count(document_type).await
    }

    async fn clear(&self, document_type: &str) -> StorageResult<()> {
        self.used_index.clear(document_type).await
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn health_check(&self) -> StorageResult<()> {
        // Check if base directory is accessible
        if !self.base_dir.exists() {
            return Err(StorageError::Unavailable);
        }

        // Try to create a test file
        let test_file = self.base_dir.join(".health_check");
        tokio::fs::write(&test_file, b"ok")
            .await
            .map_err(|e| StorageError::FileIO(format!("Health check failed: {e}")))?;
        tokio::fs::remove_file(&test_file)
            .await
            .map_err(|e| StorageError::FileIO(format!("Health check cleanup failed: {e}")))?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

/// Sanitize a name for use as a filename.
pub(crate) fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
