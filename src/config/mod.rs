//! Configuration management module.
//!
//! Supports loading configuration from:
//! - TOML files (config/default.toml, config/{profile}.toml)
//! - Environment variables with `DOCSEQ__<SECTION>__<KEY>` pattern

mod server;
mod storage;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use server::ServerConfig;
pub use storage::{FileStorageConfig, StorageBackend, StorageConfig};

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Storage backend configuration.
    pub storage: StorageConfig,

    /// Allocator configuration.
    pub allocator: AllocatorConfig,

    /// Authentication configuration.
    pub auth: AuthConfig,

    /// Observability configuration.
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from files and environment.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. `config/default.toml`
    /// 2. `config/{DOCSEQ_PROFILE}.toml` (if `DOCSEQ_PROFILE` is set)
    /// 3. Environment variables with `DOCSEQ__` prefix
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        // Determine profile
        let profile = std::env::var("DOCSEQ_PROFILE").unwrap_or_else(|_| "development".to_string());

        // Build configuration
        let config = Config::builder()
            // Load default configuration
            .add_source(File::with_name("config/default").required(false))
            // Load profile-specific configuration
            .add_source(File::with_name(&format!("config/{profile}")).required(false))
            // Override with environment variables
            // DOCSEQ__SERVER__PORT=8080 -> server.port = 8080
            .add_source(
                Environment::with_prefix("DOCSEQ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Deserialize and validate
        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("server.port cannot be 0".to_string()));
        }

        self.storage.validate()?;

        if self.allocator.max_attempts == 0 {
            return Err(ConfigError::Message(
                "allocator.max_attempts cannot be 0".to_string(),
            ));
        }
        if self.allocator.preview_limit == 0 {
            return Err(ConfigError::Message(
                "allocator.preview_limit cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Sequence allocator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AllocatorConfig {
    /// Retry bound when candidates collide with the used index.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Maximum number of candidates a preview request may ask for.
    #[serde(default = "default_preview_limit")]
    pub preview_limit: u32,
}

const fn default_max_attempts() -> u32 {
    1000
}

const fn default_preview_limit() -> u32 {
    100
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1000,
            preview_limit: 100,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Admin token for the administrative surface.
    #[serde(default = "default_admin_token")]
    pub admin_token: String,
}

fn default_admin_token() -> String {
    "admin_change_me_in_production".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_token: default_admin_token(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Enable Prometheus metrics endpoint.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

const fn default_metrics_enabled() -> bool {
    true
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_enabled: true,
        }
    }
}
