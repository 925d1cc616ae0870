//! Application state for Axum handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::AppConfig;
use crate::service::{AdminService, SequenceAllocator};
use crate::storage::traits::Storage;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Storage backend.
    pub storage: Arc<dyn Storage>,
    /// Sequence allocator.
    pub allocator: Arc<SequenceAllocator>,
    /// Administrative service.
    pub admin_service: Arc<AdminService>,
    /// Prometheus metrics handle, absent when metrics are disabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: Arc<AppConfig>,
        storage: Arc<dyn Storage>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let allocator = Arc::new(SequenceAllocator::new(
            Arc::clone(&storage),
            &config.allocator,
        ));

        let admin_service = Arc::new(AdminService::new(
            Arc::clone(&storage),
            Arc::clone(&allocator),
        ));

        Self {
            config,
            storage,
            allocator,
            admin_service,
            metrics,
        }
    }
}
