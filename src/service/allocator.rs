//! Sequence allocator.
//!
//! Owns the per-document-type critical section: reset evaluation, candidate
//! search against the used-identifier index, and the counter advance all
//! happen under one lock per type. Allocation across different document
//! types never contends.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::config::AllocatorConfig;
use crate::domain::{SequenceConfig, SequenceCounter, SequenceFormat};
use crate::error::{AppError, Result};
use crate::service::render::render;
use crate::storage::traits::Storage;

/// Service allocating unique formatted identifiers per document type.
pub struct SequenceAllocator {
    /// Storage backend.
    storage: Arc<dyn Storage>,
    /// One lock per document type; the map grows with the set of types.
    locks: DashMap<String, Arc<Mutex<()>>>,
    /// Retry bound when candidates collide with the used index.
    max_attempts: u32,
}

impl SequenceAllocator {
    /// Create a new allocator.
    pub fn new(storage: Arc<dyn Storage>, config: &AllocatorConfig) -> Self {
        Self {
            storage,
            locks: DashMap::new(),
            max_attempts: config.max_attempts,
        }
    }

    /// The mutual-exclusion lock guarding one document type's counter and
    /// used index. `reset_system` takes the same lock so a reset cannot
    /// interleave with an allocation.
    pub(crate) fn type_lock(&self, document_type: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(document_type.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load the config for a type, materializing defaults on first use.
    ///
    /// Initialization is idempotent; a concurrent initializer racing through
    /// another instance leaves the same defaults in place.
    async fn load_or_init(&self, document_type: &str) -> Result<SequenceConfig> {
        if let Some(config) = self.storage.get_config(document_type).await? {
            return Ok(config);
        }

        let config = SequenceConfig::defaults_for(document_type);
        self.storage.save_config(&config).await?;
        self.storage
            .initialize_counter(document_type, config.baseline())
            .await?;

        tracing::info!(document_type, "Materialized default sequence config");
        Ok(config)
    }

    /// Allocate the next identifier for a document type.
    ///
    /// # Errors
    ///
    /// Fails with `InactiveConfig` for disabled types,
    /// `ExhaustedSequenceSpace` when the retry bound is hit, and propagates
    /// storage errors unchanged - no identifier is returned unless the
    /// counter and used-index updates were persisted.
    pub async fn allocate(&self, document_type: &str) -> Result<String> {
        self.allocate_at(document_type, Utc::now()).await
    }

    /// Clock-injected allocation; `now` drives reset evaluation and date
    /// segments.
    async fn allocate_at(&self, document_type: &str, now: DateTime<Utc>) -> Result<String> {
        let lock = self.type_lock(document_type);
        let _guard = lock.lock().await;

        let config = self.load_or_init(document_type).await?;
        if !config.is_active {
            return Err(AppError::InactiveConfig(document_type.to_string()));
        }

        let mut counter = match self.storage.get_counter(document_type).await? {
            Some(counter) => counter,
            None => {
                self.storage
                    .initialize_counter(document_type, config.baseline())
                    .await?;
                SequenceCounter::new(document_type.to_string(), config.baseline())
            }
        };

        // The reset must land before any candidate is computed, and inside
        // this critical section.
        if counter.reset_due(config.reset_frequency, now) {
            counter.apply_reset(config.baseline(), now);
            self.storage.put_counter(&counter).await?;
            tracing::info!(document_type, baseline = counter.last_number, "Sequence reset");
        }

        let mut chosen: Option<(i64, String)> = None;

        for attempt in 1..=i64::from(self.max_attempts) {
            // Timestamp identifiers only advance with the clock, so retries
            // take a fresh reading instead of re-rendering the same value.
            let render_now = if attempt > 1 && config.format == SequenceFormat::PrefixTimestamp {
                Utc::now()
            } else {
                now
            };

            let candidate_seq = counter.last_number + attempt;
            let candidate = render(candidate_seq, &config, render_now);

            if self.storage.contains(document_type, &candidate).await? {
                metrics::counter!(
                    "docseq_collisions_total",
                    "document_type" => document_type.to_string()
                )
                .increment(1);
                continue;
            }

            chosen = Some((candidate_seq, candidate));
            break;
        }

        let Some((candidate_seq, candidate)) = chosen else {
            return Err(AppError::ExhaustedSequenceSpace(document_type.to_string()));
        };

        // Skipped numbers between last_number and candidate_seq were consumed
        // by reservations; the cursor advances past them and never revisits.
        counter.last_number = candidate_seq;
        self.storage.put_counter(&counter).await?;

        if !self
            .storage
            .insert_if_absent(document_type, &candidate)
            .await?
        {
            return Err(AppError::Internal(format!(
                "identifier {candidate} appeared in the used index mid-allocation"
            )));
        }

        metrics::counter!(
            "docseq_allocations_total",
            "document_type" => document_type.to_string()
        )
        .increment(1);

        Ok(candidate)
    }

    /// Reserve an identifier out of band.
    ///
    /// The counter does not advance; the allocator later skips the reserved
    /// identifier via its collision loop.
    ///
    /// # Errors
    ///
    /// Fails with `AlreadyUsed` when the identifier is in the index, or
    /// `BadRequest` when its shape does not match the type's configuration.
    pub async fn reserve(&self, document_type: &str, identifier: &str) -> Result<()> {
        let lock = self.type_lock(document_type);
        let _guard = lock.lock().await;

        let config = self.load_or_init(document_type).await?;
        validate_identifier_shape(&config, identifier)?;

        if !self
            .storage
            .insert_if_absent(document_type, identifier)
            .await?
        {
            return Err(AppError::AlreadyUsed(identifier.to_string()));
        }

        metrics::counter!(
            "docseq_reservations_total",
            "document_type" => document_type.to_string()
        )
        .increment(1);

        Ok(())
    }

    /// Release a previously issued or reserved identifier.
    ///
    /// Removes it from the used index without rewinding the counter; returns
    /// whether the identifier was present.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn release(&self, document_type: &str, identifier: &str) -> Result<bool> {
        let lock = self.type_lock(document_type);
        let _guard = lock.lock().await;

        Ok(self.storage.remove(document_type, identifier).await?)
    }

    /// Render the next `count` candidates from the current cursor.
    ///
    /// Advisory only: runs unlocked, consults neither the used index nor the
    /// reset policy, and mutates nothing, so repeated calls with no
    /// intervening allocation return identical output.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn preview_next(&self, document_type: &str, count: u32) -> Result<Vec<String>> {
        let config = match self.storage.get_config(document_type).await? {
            Some(config) => config,
            None => SequenceConfig::defaults_for(document_type),
        };

        let cursor = self
            .storage
            .get_counter(document_type)
            .await?
            .map_or_else(|| config.baseline(), |counter| counter.last_number);

        let now = Utc::now();
        Ok((1..=i64::from(count))
            .map(|offset| render(cursor + offset, &config, now))
            .collect())
    }
}

/// Validate a manually supplied identifier against the type's configuration.
///
/// Sequential and date formats must carry the configured prefix and a numeric
/// tail at least `pad_length` wide; custom patterns are only checked for the
/// prefix, since the pattern controls everything else.
fn validate_identifier_shape(config: &SequenceConfig, identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(AppError::BadRequest("identifier cannot be empty".to_string()));
    }

    if config.format.uses_prefix() && !config.prefix.is_empty() {
        let prefix_ok = match config.format {
            SequenceFormat::YearPrefixSequential
            | SequenceFormat::DatePrefixSequential
            | SequenceFormat::Custom => identifier.contains(&config.prefix),
            _ => identifier.starts_with(&config.prefix),
        };
        if !prefix_ok {
            return Err(AppError::BadRequest(format!(
                "identifier does not carry prefix '{}'",
                config.prefix
            )));
        }
    }

    if config.format.is_sequential() && config.format != SequenceFormat::Custom {
        let mut core = identifier;
        if !config.suffix.is_empty() {
            let trailer = format!("{}{}", config.separator, config.suffix);
            core = core.strip_suffix(&trailer).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "identifier does not carry suffix '{}'",
                    config.suffix
                ))
            })?;
        }

        let tail_digits = core
            .chars()
            .rev()
            .take_while(char::is_ascii_digit)
            .count();
        if tail_digits < config.pad_length as usize {
            return Err(AppError::BadRequest(format!(
                "identifier numeric tail is narrower than pad_length {}",
                config.pad_length
            )));
        }
    }

    Ok(())
}
