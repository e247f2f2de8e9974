use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level gateway configuration (loaded from tidegate.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP listen address for the HTTP API (default: 127.0.0.1:8686)
    pub listen: String,
    /// Prometheus metrics + health endpoint (default: 127.0.0.1:9100)
    pub metrics_addr: Option<String>,
    /// Log level (default: info)
    pub log_level: String,
    /// Log format: "json" or "text"
    pub log_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// S3-compatible endpoint
    pub endpoint: String,
    /// S3 region (default: us-east-1)
    pub region: String,
    /// Bucket holding encrypted objects
    pub bucket: String,
    /// Key prefix for stored object data (default: objects)
    pub data_prefix: String,
    /// Key prefix for metadata sidecars (default: meta)
    pub meta_prefix: String,
    /// Enforce HTTPS for S3 connections (warn/error on HTTP endpoints)
    pub enforce_tls: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8686".into(),
            metrics_addr: Some("127.0.0.1:9100".into()),
            log_level: "info".into(),
            log_format: "json".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8333".into(),
            region: "us-east-1".into(),
            bucket: "tidegate".into(),
            data_prefix: "objects".into(),
            meta_prefix: "meta".into(),
            enforce_tls: false,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("reading config {}: {e}", path.display()))?;
            toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("parsing config {}: {e}", path.display()))
        } else {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            Ok(Self::default())
        }
    }
}
