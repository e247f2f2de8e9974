//! Prometheus /metrics + health check HTTP endpoints
//!
//! Endpoints:
//!   GET /metrics  — Prometheus text format
//!   GET /healthz  — Liveness probe (always 200 if process is running)
//!   GET /readyz   — Readiness probe (200 if storage is reachable)

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus_client::{
    encoding::text::encode,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};
use std::sync::Arc;

/// Request/byte counters for the gateway API.
#[derive(Clone)]
pub struct GatewayMetrics {
    requests: Family<Vec<(String, String)>, Counter>,
    bytes_in: Counter,
    bytes_out: Counter,
}

impl GatewayMetrics {
    pub fn new(registry: &mut Registry) -> Self {
        let requests = Family::default();
        let bytes_in = Counter::default();
        let bytes_out = Counter::default();

        registry.register(
            "tgw_requests_total",
            "Total object API requests served, by operation",
            requests.clone(),
        );
        registry.register(
            "tgw_bytes_in_total",
            "Total plaintext bytes accepted for upload",
            bytes_in.clone(),
        );
        registry.register(
            "tgw_bytes_out_total",
            "Total decrypted bytes served to clients",
            bytes_out.clone(),
        );

        GatewayMetrics {
            requests,
            bytes_in,
            bytes_out,
        }
    }

    pub fn record_request(&self, op: &str) {
        self.requests
            .get_or_create(&vec![("op".to_string(), op.to_string())])
            .inc();
    }

    pub fn add_bytes_in(&self, n: u64) {
        self.bytes_in.inc_by(n);
    }

    pub fn add_bytes_out(&self, n: u64) {
        self.bytes_out.inc_by(n);
    }
}

/// Shared state for the metrics listener
#[derive(Clone)]
pub struct HealthState {
    pub registry: Arc<Registry>,
    pub operator: opendal::Operator,
}

/// Serve Prometheus metrics and health endpoints on `addr` (e.g. "127.0.0.1:9100")
pub async fn serve(addr: String, state: HealthState) -> Result<()> {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("metrics bind {addr}: {e}"))?;

    tracing::info!(addr = %addr, "metrics: listening on /metrics, /healthz, /readyz");

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("metrics server: {e}"))
}

async fn metrics_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let mut body = String::new();
    match encode(&mut body, &state.registry) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            tracing::error!("metrics encode failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                e.to_string(),
            )
        }
    }
}

/// Liveness probe: returns 200 if the process is running.
async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness probe: returns 200 if storage is reachable, 503 otherwise.
async fn readyz_handler(State(state): State<HealthState>) -> impl IntoResponse {
    match tgw_storage::check_health(&state.operator).await {
        Ok(()) => (StatusCode::OK, "ready"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "storage unreachable"),
    }
}
