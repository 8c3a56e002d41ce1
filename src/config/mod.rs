use crate::auth::{DEFAULT_API_KEY_HEADER, DEFAULT_REALM};
use crate::blob::DEFAULT_CHUNK_SIZE;
use crate::task::DEFAULT_TASKS_FILE;
use serde::Deserialize;
use std::time::Duration;

/// Default ceiling for request bodies (16 MB, decimal)
pub const DEFAULT_MAX_BODY_BYTES: u64 = 16_000_000;

/// Complete gateway configuration.
///
/// The four positional startup arguments (listen address, store address,
/// database name, API key) are not part of this file; it only carries tunables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Header carrying the shared API key
    #[serde(default = "default_api_key_header")]
    pub header: String,
    /// Realm advertised in the basic-auth challenge
    #[serde(default = "default_realm")]
    pub realm: String,
}

fn default_api_key_header() -> String {
    DEFAULT_API_KEY_HEADER.to_string()
}

fn default_realm() -> String {
    DEFAULT_REALM.to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header: default_api_key_header(),
            realm: default_realm(),
        }
    }
}

/// Request body limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Largest accepted `/upload` body, declared or streamed
    #[serde(default = "default_max_body_bytes")]
    pub max_upload_bytes: u64,
    /// Largest accepted `/events` body
    #[serde(default = "default_max_body_bytes")]
    pub max_event_bytes: u64,
}

fn default_max_body_bytes() -> u64 {
    DEFAULT_MAX_BODY_BYTES
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_body_bytes(),
            max_event_bytes: default_max_body_bytes(),
        }
    }
}

impl LimitsConfig {
    /// Applies `REMAP_MAX_UPLOAD_BYTES` / `REMAP_MAX_EVENT_BYTES` overrides.
    /// Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("REMAP_MAX_UPLOAD_BYTES") {
            if let Ok(n) = v.parse::<u64>() {
                self.max_upload_bytes = n;
            }
        }
        if let Ok(v) = std::env::var("REMAP_MAX_EVENT_BYTES") {
            if let Ok(n) = v.parse::<u64>() {
                self.max_event_bytes = n;
            }
        }
    }
}

/// Document store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Bound on the startup connect and reachability check
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Chunk size for blob uploads
    #[serde(default = "default_chunk_size")]
    pub blob_chunk_size_bytes: usize,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: default_connect_timeout(),
            blob_chunk_size_bytes: default_chunk_size(),
        }
    }
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Where `/tasks` reads descriptors from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskSource {
    /// The `tasks` collection of the document store
    Store,
    /// A static JSON file
    File,
}

/// Task catalog configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_task_source")]
    pub source: TaskSource,
    /// Catalog file used when `source = "file"`
    #[serde(default = "default_tasks_file")]
    pub file: String,
}

fn default_task_source() -> TaskSource {
    TaskSource::Store
}

fn default_tasks_file() -> String {
    DEFAULT_TASKS_FILE.to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            source: default_task_source(),
            file: default_tasks_file(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&contents)?;
    Ok(config)
}
