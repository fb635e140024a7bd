//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::AppResult;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Remote procedure endpoint configuration.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Overlay cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Ledger validation policy.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// List paging defaults.
    #[serde(default)]
    pub listing: ListingConfig,
}

/// Remote procedure endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL; procedures are posted to `{base_url}/{procedure}`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/rpc".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Overlay cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Prefix combined with the session id to form the storage key.
    #[serde(default = "default_namespace_prefix")]
    pub namespace_prefix: String,
    /// Directory for the file-backed store used by the console.
    #[serde(default = "default_cache_directory")]
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace_prefix: default_namespace_prefix(),
            directory: default_cache_directory(),
        }
    }
}

fn default_namespace_prefix() -> String {
    "puente.overlay".to_string()
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from(".puente/cache")
}

/// Ledger validation policy.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Reject transactions whose positive credit lines all share one amount.
    #[serde(default = "default_reject_uniform_credits")]
    pub reject_uniform_credits: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reject_uniform_credits: default_reject_uniform_credits(),
        }
    }
}

fn default_reject_uniform_credits() -> bool {
    true
}

/// List paging defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    /// Number of records requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    20
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PUENTE").separator("__"))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        tracing::debug!(
            run_mode = %run_mode,
            base_url = %loaded.remote.base_url,
            "configuration loaded"
        );
        Ok(loaded)
    }
}
