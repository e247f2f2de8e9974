//! Daemon lifecycle: credentials, storage connectivity, metrics, HTTP serve

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tgw_core::GatewayConfig;
use tgw_storage::{Catalog, ObjectStore};
use tracing::{error, info, warn};

use crate::metrics::{GatewayMetrics, HealthState};
use crate::routes::{self, AppState};

pub async fn run(config: GatewayConfig) -> Result<()> {
    info!("gateway starting");

    // Load credentials from env
    let access_key = std::env::var("AWS_ACCESS_KEY_ID")
        .or_else(|_| std::env::var("TGW_ACCESS_KEY_ID"))
        .context("S3 credentials not set: export AWS_ACCESS_KEY_ID")?;
    let secret_key: SecretString = std::env::var("AWS_SECRET_ACCESS_KEY")
        .or_else(|_| std::env::var("TGW_SECRET_ACCESS_KEY"))
        .context("AWS_SECRET_ACCESS_KEY not set")?
        .into();

    // Build storage operator and verify connectivity
    let op = tgw_storage::operator::build_from_core_config(
        &config.storage,
        &access_key,
        secret_key.expose_secret(),
    )
    .context("building storage operator")?;

    match tgw_storage::check_health(&op).await {
        Ok(()) => info!(endpoint = %config.storage.endpoint, "object store: connected"),
        // The gateway still starts: readiness stays false until storage answers
        Err(e) => warn!(endpoint = %config.storage.endpoint, "object store: {e}"),
    }

    // Prometheus metrics + health endpoints
    let mut registry = prometheus_client::registry::Registry::default();
    let metrics = GatewayMetrics::new(&mut registry);
    if let Some(addr) = config.server.metrics_addr.clone() {
        let health = HealthState {
            registry: Arc::new(registry),
            operator: op.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = crate::metrics::serve(addr, health).await {
                error!("metrics server failed: {e}");
            }
        });
    }

    let state = AppState {
        store: ObjectStore::new(op.clone()),
        catalog: Catalog::new(op, config.storage.meta_prefix.clone()),
        data_prefix: config.storage.data_prefix.clone(),
        metrics,
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("binding {}", config.server.listen))?;
    info!(addr = %config.server.listen, "gateway: listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("gateway stopped");
    Ok(())
}

/// Resolve on SIGTERM or ctrl-c; in-flight responses drain before exit.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("installing ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("installing SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining");
}
