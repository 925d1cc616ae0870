//! File-based configuration storage.

use std::path::PathBuf;

use async_trait::async_trait;
use fs2::FileExt;
use tokio::sync::Mutex;

use crate::domain::SequenceConfig;
use crate::error::{StorageError, StorageResult};
use crate::storage::file::sanitize_name;
use crate::storage::traits::ConfigStorage;

/// File-based configuration storage implementation.
pub struct FileConfigStorage {
    /// Directory for config files.
    configs_dir: PathBuf,
    /// Mutex for coordinating file operations.
    lock: Mutex<()>,
}

impl FileConfigStorage {
    /// Create a new file config storage.
    #[must_use]
    pub fn new(configs_dir: PathBuf) -> Self {
        Self {
            configs_dir,
            lock: Mutex::new(()),
        }
    }

    /// Get the file path for a config.
    fn config_path(&self, document_type: &str) -> PathBuf {
        self.configs_dir
            .join(format!("{}.json", sanitize_name(document_type)))
    }
}

#[async_trait]
impl ConfigStorage for FileConfigStorage {
    async fn get_config(&self, document_type: &str) -> StorageResult<Option<SequenceConfig>> {
        let _guard = self.lock.lock().await;

        let path = self.config_path(document_type);
        if !path.exists() {
            return Ok(None);
        }

        let file = std::fs::File::open(&path)?;
        file.lock_shared()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let config: SequenceConfig = serde_json::from_reader(&file)?;
        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        Ok(Some(config))
    }

    async fn save_config(&self, config: &SequenceConfig) -> StorageResult<()> {
        let _guard = self.lock.lock().await;

        let path = self.config_path(&config.document_type);

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        file.lock_exclusive()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        serde_json::to_writer_pretty(&file, config)?;
        file.sync_all()?;
        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        Ok(())
    }

    async fn list_configs(&self) -> StorageResult<Vec<SequenceConfig>> {
        let _guard = self.lock.lock().await;

        if !self.configs_dir.exists() {
            return Ok(Vec::new());
        }

        let mut configs = Vec::new();

        for entry in std::fs::read_dir(&self.configs_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                let file = std::fs::File::open(&path)?;
                file.lock_shared()
                    .map_err(|e| StorageError::LockFailed(e.to_string()))?;

                match serde_json::from_reader(&file) {
                    Ok(config) => configs.push(config),
                    Err(e) => {
                        tracing::warn!(path = ?path, error = %e, "Failed to parse config file");
                    }
                }

                file.unlock()
                    .map_err(|e| StorageError::LockFailed(e.to_string()))?;
            }
        }

        configs.sort_by(|a: &SequenceConfig, b: &SequenceConfig| {
            a.document_type.cmp(&b.document_type)
        });

        Ok(configs)
    }

    async fn delete_config(&self, document_type: &str) -> StorageResult<bool> {
        let _guard = self.lock.lock().await;

        let path = self.config_path(document_type);
        if !path.exists() {
            return Ok(false);
        }

        std::fs::remove_file(&path)?;
        Ok(true)
    }
}
