//! Configuration types for ProtoGraph

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::paging::PagePolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Network addresses of the backend domain services, in gateway connection order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendAddresses {
    pub account: String,
    pub catalog: String,
    pub order: String,
}

impl Default for BackendAddresses {
    fn default() -> Self {
        Self {
            account: "127.0.0.1:8081".to_string(),
            catalog: "127.0.0.1:8082".to_string(),
            order: "127.0.0.1:8083".to_string(),
        }
    }
}

/// Gateway configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySettings {
    #[serde(default)]
    pub backends: BackendAddresses,

    /// Address the HTTP query surface listens on
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Upper bound for establishing one backend connection
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Upper bound for each nested (fan-out) call
    #[serde(default = "default_nested_timeout_ms")]
    pub nested_timeout_ms: u64,

    /// Deadline given to every incoming query
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    3_000
}

fn default_nested_timeout_ms() -> u64 {
    2_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            backends: BackendAddresses::default(),
            listen: default_listen(),
            connect_timeout_ms: default_connect_timeout_ms(),
            nested_timeout_ms: default_nested_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl GatewaySettings {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn nested_timeout(&self) -> Duration {
        Duration::from_millis(self.nested_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Domain service configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSettings {
    /// PostgreSQL connection string; in-memory storage when absent
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_service_listen")]
    pub listen: String,

    #[serde(default)]
    pub paging: PagePolicy,

    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    #[serde(default = "default_connect_delay_ms")]
    pub connect_delay_ms: u64,
}

fn default_service_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_connect_delay_ms() -> u64 {
    2_000
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            database_url: None,
            listen: default_service_listen(),
            paging: PagePolicy::default(),
            connect_attempts: default_connect_attempts(),
            connect_delay_ms: default_connect_delay_ms(),
        }
    }
}

impl ServiceSettings {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }
}
