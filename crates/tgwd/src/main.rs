//! tgwd: TideGate encrypted object-storage gateway daemon
//!
//! Usage:
//!   tgwd [--config /etc/tidegate/tidegate.toml]
//!
//! Serves the object API (upload, full download, ranged download) on the
//! configured listen address, plus Prometheus metrics and health probes on
//! a separate metrics address.

mod daemon;
mod metrics;
mod routes;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tgwd", version, about = "TideGate encrypted object-storage gateway")]
struct Cli {
    /// Path to tidegate.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "TGW_CONFIG",
        default_value = "/etc/tidegate/tidegate.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TGW_LOG", default_value = "info")]
    log: String,

    /// Log format (json, text)
    #[arg(long, env = "TGW_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log, &cli.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "tgwd starting"
    );

    let config = tgw_core::GatewayConfig::load(&cli.config)?;

    daemon::run(config).await
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}
