//! Administrative surface.
//!
//! Thin CRUD over the configuration store plus the explicit operations the
//! allocator must never perform on its own: bulk format changes and the
//! irreversible per-type system reset.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    BulkFormatFailure, BulkFormatRequest, BulkFormatResponse, ConfigPatch, SequenceConfig,
    SequenceCounter, StatisticsResponse,
};
use crate::error::{AppError, Result};
use crate::service::allocator::SequenceAllocator;
use crate::service::render::render;
use crate::storage::traits::Storage;

/// Service for sequence configuration management.
pub struct AdminService {
    /// Storage backend.
    storage: Arc<dyn Storage>,
    /// Allocator whose per-type locks guard resets against in-flight allocations.
    allocator: Arc<SequenceAllocator>,
}

impl AdminService {
    /// Create a new admin service.
    pub fn new(storage: Arc<dyn Storage>, allocator: Arc<SequenceAllocator>) -> Self {
        Self { storage, allocator }
    }

    /// Get a sequence configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the document type has never been configured.
    pub async fn get_config(&self, document_type: &str) -> Result<SequenceConfig> {
        self.storage
            .get_config(document_type)
            .await?
            .ok_or_else(|| AppError::ConfigNotFound(document_type.to_string()))
    }

    /// List all sequence configurations.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn list_configs(&self) -> Result<Vec<SequenceConfig>> {
        Ok(self.storage.list_configs().await?)
    }

    /// Merge a partial update into a document type's configuration.
    ///
    /// A type that has never been used is materialized with defaults first.
    /// Changing format, separator, or pad length never rewrites identifiers
    /// that were already issued.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` when the merged configuration fails
    /// validation; nothing is persisted in that case.
    pub async fn update_config(
        &self,
        document_type: &str,
        patch: ConfigPatch,
    ) -> Result<SequenceConfig> {
        let existing = self.storage.get_config(document_type).await?;
        let is_new = existing.is_none();

        let mut config =
            existing.unwrap_or_else(|| SequenceConfig::defaults_for(document_type));
        apply_patch(&mut config, patch);

        config.validate().map_err(AppError::InvalidFormat)?;

        self.storage.save_config(&config).await?;
        if is_new {
            self.storage
                .initialize_counter(document_type, config.baseline())
                .await?;
        }

        tracing::info!(document_type, format = %config.format, "Sequence config updated");
        Ok(config)
    }

    /// Apply one format, separator, and pad length across all configured types.
    ///
    /// Types that fail validation or persistence are reported individually;
    /// types that already succeeded are not rolled back.
    ///
    /// # Errors
    ///
    /// Propagates a storage error only from the initial listing; per-type
    /// failures land in the response.
    pub async fn bulk_update_format(&self, request: BulkFormatRequest) -> Result<BulkFormatResponse> {
        let configs = self.storage.list_configs().await?;

        let mut updated = Vec::new();
        let mut failed = Vec::new();

        for mut config in configs {
            config.format = request.format;
            config.separator = request.separator.clone();
            config.pad_length = request.pad_length;

            if let Err(reason) = config.validate() {
                failed.push(BulkFormatFailure {
                    document_type: config.document_type,
                    reason,
                });
                continue;
            }

            match self.storage.save_config(&config).await {
                Ok(()) => updated.push(config.document_type),
                Err(e) => failed.push(BulkFormatFailure {
                    document_type: config.document_type,
                    reason: e.to_string(),
                }),
            }
        }

        if !failed.is_empty() {
            tracing::warn!(
                updated = updated.len(),
                failed = failed.len(),
                "Bulk format update finished with partial failures"
            );
        }

        Ok(BulkFormatResponse { updated, failed })
    }

    /// Reset a document type's counter and used index back to defaults.
    ///
    /// Irreversible. Takes the allocator's per-type lock so the reset cannot
    /// interleave with an in-flight allocation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` for unconfigured types and propagates
    /// storage errors.
    pub async fn reset_system(&self, document_type: &str) -> Result<()> {
        let lock = self.allocator.type_lock(document_type);
        let _guard = lock.lock().await;

        let config = self
            .storage
            .get_config(document_type)
            .await?
            .ok_or_else(|| AppError::ConfigNotFound(document_type.to_string()))?;

        let counter = SequenceCounter::new(document_type.to_string(), config.baseline());
        self.storage.put_counter(&counter).await?;
        self.storage.clear(document_type).await?;

        tracing::warn!(document_type, "Sequence system reset");
        Ok(())
    }

    /// Sequence statistics for one document type.
    ///
    /// Unlocked, advisory reads; a stale snapshot is acceptable.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn statistics(&self, document_type: &str) -> Result<StatisticsResponse> {
        let config = match self.storage.get_config(document_type).await? {
            Some(config) => config,
            None => SequenceConfig::defaults_for(document_type),
        };

        let last_number = self
            .storage
            .get_counter(document_type)
            .await?
            .map_or_else(|| config.baseline(), |counter| counter.last_number);

        let used_count = self.storage.count(document_type).await?;

        Ok(StatisticsResponse {
            document_type: document_type.to_string(),
            total_generated: (last_number - config.baseline()).max(0),
            next_number_preview: render(last_number + 1, &config, Utc::now()),
            used_count,
        })
    }
}

/// Merge set fields of a patch into a configuration. Empty strings clear the
/// optional date format and custom pattern.
fn apply_patch(config: &mut SequenceConfig, patch: ConfigPatch) {
    if let Some(prefix) = patch.prefix {
        config.prefix = prefix;
    }
    if let Some(suffix) = patch.suffix {
        config.suffix = suffix;
    }
    if let Some(pad_length) = patch.pad_length {
        config.pad_length = pad_length;
    }
    if let Some(separator) = patch.separator {
        config.separator = separator;
    }
    if let Some(format) = patch.format {
        config.format = format;
    }
    if let Some(date_format) = patch.date_format {
        config.date_format = (!date_format.is_empty()).then_some(date_format);
    }
    if let Some(custom_pattern) = patch.custom_pattern {
        config.custom_pattern = (!custom_pattern.is_empty()).then_some(custom_pattern);
    }
    if let Some(reset_frequency) = patch.reset_frequency {
        config.reset_frequency = reset_frequency;
    }
    if let Some(starting_number) = patch.starting_number {
        config.starting_number = starting_number;
    }
    if let Some(is_active) = patch.is_active {
        config.is_active = is_active;
    }
}
