pub mod config;

pub use config::{GatewayConfig, ServerConfig, StorageConfig};
