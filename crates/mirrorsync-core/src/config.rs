//! Configuration module for MirrorSync.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation and defaults, plus the JSON credential
//! file injected into remote backend construction. The core never reads
//! configuration sources on its own behalf; the CLI loads both once at
//! startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Top-level configuration for MirrorSync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Attempts per network-sensitive operation (store, fetch, manifest
    /// write) before the entry is reported as failed.
    pub retry_attempts: u32,
    /// Fixed delay between retry attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Flush the directory manifest once this many updates are pending.
    pub batch_max_pending: usize,
    /// Flush the directory manifest after any single transfer of at least
    /// this many bytes.
    pub batch_flush_bytes: u64,
    /// Default transfer budget in bytes; `None` means unlimited.
    pub budget_bytes: Option<u64>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/mirrorsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("mirrorsync")
            .join("config.yaml")
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay_ms: 500,
            batch_max_pending: 20,
            batch_flush_bytes: 1024 * 1024,
            budget_bytes: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Remote object-store credentials and per-backend options.
///
/// Loaded once at startup from a JSON file and injected into backend
/// construction. The authentication handshake itself is the adapter's
/// concern; the core only carries the material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Base URL of the object-store API, e.g. `https://storage.example.com/v1`.
    pub endpoint: String,
    /// Pre-shared auth token sent with every request.
    pub auth_token: String,
    /// Optional storage tier/class applied to uploads.
    #[serde(default)]
    pub storage_class: Option<String>,
    /// Optional per-region endpoint overrides; a location like
    /// `swift+dfw://container` selects the `dfw` entry.
    #[serde(default)]
    pub region_endpoints: BTreeMap<String, String>,
}

impl Credentials {
    /// Load credentials from a JSON file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let credentials: Credentials = serde_json::from_str(&content)?;
        Ok(credentials)
    }

    /// Platform-appropriate default path for the credential file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("mirrorsync")
            .join("credentials.json")
    }

    /// The endpoint to use for `region`, falling back to the default
    /// endpoint when the region has no override.
    pub fn endpoint_for(&self, region: Option<&str>) -> &str {
        region
            .and_then(|r| self.region_endpoints.get(r))
            .map(String::as_str)
            .unwrap_or(&self.endpoint)
    }
}
