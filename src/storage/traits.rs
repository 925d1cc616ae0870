//! Storage trait definitions.
//!
//! These traits define the interface for storage backends, enabling swapping
//! between different implementations without changing business logic. The
//! allocator serializes its read-modify-write per document type; the traits
//! only promise atomicity of each individual operation.

use async_trait::async_trait;

use crate::domain::{SequenceConfig, SequenceCounter};
use crate::error::StorageResult;

/// Counter storage operations.
#[async_trait]
pub trait CounterStorage: Send + Sync {
    /// Load the counter for a document type.
    async fn get_counter(&self, document_type: &str) -> StorageResult<Option<SequenceCounter>>;

    /// Persist a counter, bumping its version and update timestamp.
    async fn put_counter(&self, counter: &SequenceCounter) -> StorageResult<()>;

    /// Create the counter at the given baseline if it does not exist.
    ///
    /// This is idempotent - an existing counter is never modified.
    async fn initialize_counter(&self, document_type: &str, baseline: i64) -> StorageResult<()>;
}

/// Configuration storage operations.
#[async_trait]
pub trait ConfigStorage: Send + Sync {
    /// Get a sequence configuration by document type.
    async fn get_config(&self, document_type: &str) -> StorageResult<Option<SequenceConfig>>;

    /// Save a sequence configuration.
    async fn save_config(&self, config: &SequenceConfig) -> StorageResult<()>;

    /// List all sequence configurations.
    async fn list_configs(&self) -> StorageResult<Vec<SequenceConfig>>;

    /// Delete a sequence configuration.
    async fn delete_config(&self, document_type: &str) -> StorageResult<bool>;
}

/// Used-identifier index operations.
///
/// One set per document type. Every identifier the allocator has ever
/// returned for a type is present in that type's set; reservations add
/// entries out of band.
#[async_trait]
pub trait UsedIndexStorage: Send + Sync {
    /// Check whether an identifier is present in the index.
    async fn contains(&self, document_type: &str, identifier: &str) -> StorageResult<bool>;

    /// Insert an identifier if absent.
    ///
    /// Returns `false` when the identifier was already present.
    async fn insert_if_absent(&self, document_type: &str, identifier: &str)
    -> StorageResult<bool>;

    /// Remove an identifier from the index.
    ///
    /// Returns whether the identifier was present.
    async fn remove(&self, document_type: &str, identifier: &str) -> StorageResult<bool>;

    /// Number of identifiers in the index for a document type.
    async fn count(&self, document_type: &str) -> StorageResult<u64>;

    /// Remove every identifier for a document type.
    async fn clear(&self, document_type: &str) -> StorageResult<()>;
}

/// Combined storage trait for all storage operations.
#[async_trait]
pub trait Storage: CounterStorage + ConfigStorage + UsedIndexStorage {
    /// Check if the storage backend is healthy and reachable.
    async fn health_check(&self) -> StorageResult<()>;

    /// Get the storage backend name.
    fn backend_name(&self) -> &'static str;
}
