//! File-based used-identifier index.
//!
//! One JSON file per document type holding the sorted set of issued
//! identifiers. Mutations rewrite the whole set under an exclusive flock;
//! these sets stay small enough (one entry per issued document) that a full
//! rewrite is cheaper than maintaining an on-disk structure.

use std::collections::BTreeSet;
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use fs2::FileExt;
use tokio::sync::Mutex;

use crate::error::{StorageError, StorageResult};
use crate::storage::file::sanitize_name;
use crate::storage::traits::UsedIndexStorage;

/// File-based used-identifier index implementation.
pub struct FileUsedIndex {
    /// Directory for index files.
    used_dir: PathBuf,
    /// Mutex for coordinating file operations within this process.
    lock: Mutex<()>,
}

impl FileUsedIndex {
    /// Create a new file used-identifier index.
    #[must_use]
    pub fn new(used_dir: PathBuf) -> Self {
        Self {
            used_dir,
            lock: Mutex::new(()),
        }
    }

    /// Get the file path for a document type's index.
    fn index_path(&self, document_type: &str) -> PathBuf {
        self.used_dir
            .join(format!("{}.json", sanitize_name(document_type)))
    }

    /// Read the set with a shared lock.
    fn read_set(&self, document_type: &str) -> StorageResult<BTreeSet<String>> {
        let path = self.index_path(document_type);

        if !path.exists() {
            return Ok(BTreeSet::new());
        }

        let file = std::fs::File::open(&path)?;
        file.lock_shared()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let set: BTreeSet<String> = serde_json::from_reader(&file)?;
        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        Ok(set)
    }

    /// Atomically update the set under an exclusive lock.
    ///
    /// `update_fn` returns the value the operation reports to the caller.
    fn update_set<F, R>(&self, document_type: &str, update_fn: F) -> StorageResult<R>
    where
        F: FnOnce(&mut BTreeSet<String>) -> R,
    {
        let path = self.index_path(document_type);

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        file.lock_exclusive()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let len = file.metadata()?.len();
        let mut set: BTreeSet<String> = if len == 0 {
            BTreeSet::new()
        } else {
            serde_json::from_reader(&file)?
        };

        let result = update_fn(&mut set);

        file.seek(SeekFrom::Start(0))?;
        file.set_len(0)?;
        let json = serde_json::to_string_pretty(&set)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        Ok(result)
    }
}

#[async_trait]
impl UsedIndexStorage for FileUsedIndex {
    async fn contains(&self, document_type: &str, identifier: &str) -> StorageResult<bool> {
        let _guard = self.lock.lock().await;
        Ok(self.read_set(document_type)?.contains(identifier))
    }

    async fn insert_if_absent(
        &self,
        document_type: &str,
        identifier: &str,
    ) -> StorageResult<bool> {
        let _guard = self.lock.lock().await;
        self.update_set(document_type, |set| set.insert(identifier.to_string()))
    }

    async fn remove(&self, document_type: &str, identifier: &str) -> StorageResult<bool> {
        let _guard = self.lock.lock().await;

        let path = self.index_path(document_type);
        if !path.exists() {
            return Ok(false);
        }

        self.update_set(document_type, |set| set.remove(identifier))
    }

    async fn count(&self, document_type: &str) -> StorageResult<u64> {
        let _guard = self.lock.lock().await;
        Ok(self.read_set(document_type)?.len() as u64)
    }

    async fn clear(&self, document_type: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().await;

        let path = self.index_path(document_type);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}
