//! File-based counter storage.

use std::path::PathBuf;

use async_trait::async_trait;
use fs2::FileExt;
use tokio::sync::Mutex;

use crate::domain::SequenceCounter;
use crate::error::{StorageError, StorageResult};
use crate::storage::file::sanitize_name;
use crate::storage::traits::CounterStorage;

/// File-based counter storage implementation.
pub struct FileCounterStorage {
    /// Directory for counter files.
    counters_dir: PathBuf,
    /// Mutex for coordinating file operations within this process.
    lock: Mutex<()>,
}

impl FileCounterStorage {
    /// Create a new file counter storage.
    #[must_use]
    pub fn new(counters_dir: PathBuf) -> Self {
        Self {
            counters_dir,
            lock: Mutex::new(()),
        }
    }

    /// Get the file path for a counter.
    fn counter_path(&self, document_type: &str) -> PathBuf {
        self.counters_dir
            .join(format!("{}.json", sanitize_name(document_type)))
    }

    /// Read counter state from file with shared lock.
    fn read_locked(&self, document_type: &str) -> StorageResult<Option<SequenceCounter>> {
        let path = self.counter_path(document_type);

        if !path.exists() {
            return Ok(None);
        }

        let file = std::fs::File::open(&path)?;
        file.lock_shared()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let counter: SequenceCounter = serde_json::from_reader(&file)?;
        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        Ok(Some(counter))
    }

    /// Write counter state to file with exclusive lock.
    fn write_locked(&self, counter: &SequenceCounter) -> StorageResult<()> {
        let path = self.counter_path(&counter.document_type);

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        file.lock_exclusive()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        serde_json::to_writer_pretty(&file, counter)?;
        file.sync_all()?;
        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl CounterStorage for FileCounterStorage {
    async fn get_counter(&self, document_type: &str) -> StorageResult<Option<SequenceCounter>> {
        let _guard = self.lock.lock().await;
        self.read_locked(document_type)
    }

    async fn put_counter(&self, counter: &SequenceCounter) -> StorageResult<()> {
        let _guard = self.lock.lock().await;

        let mut stored = counter.clone();
        stored.version = counter.version + 1;
        stored.updated_at = chrono::Utc::now().timestamp_millis();

        self.write_locked(&stored)
    }

    async fn initialize_counter(&self, document_type: &str, baseline: i64) -> StorageResult<()> {
        let _guard = self.lock.lock().await;

        let path = self.counter_path(document_type);

        // Don't overwrite an existing counter
        if path.exists() {
            return Ok(());
        }

        let counter = SequenceCounter::new(document_type.to_string(), baseline);
        self.write_locked(&counter)
    }
}
