use crate::rules::RuleSet;
use crate::Result;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::info;

/// Shared interception counters
#[derive(Debug, Default)]
pub struct Metrics {
    pub total_requests: AtomicU64,
    /// Requests answered with a bundled asset
    pub substituted: AtomicU64,
    /// Requests answered with a body-less degraded response
    pub degraded: AtomicU64,
    /// Requests forwarded unchanged
    pub passed_through: AtomicU64,
    /// Matched requests whose asset could not be opened
    pub asset_failures: AtomicU64,
    /// Assets that opened but failed while being read
    pub asset_read_errors: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub substituted: u64,
    pub degraded: u64,
    pub passed_through: u64,
    pub asset_failures: u64,
    pub asset_read_errors: u64,
}

impl Metrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            substituted: self.substituted.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            passed_through: self.passed_through.load(Ordering::Relaxed),
            asset_failures: self.asset_failures.load(Ordering::Relaxed),
            asset_read_errors: self.asset_read_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

pub fn admin_router(metrics: Arc<Metrics>, rules: Arc<RuleSet>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(move || metrics_handler(metrics)))
        .route("/rules", get(move || rules_handler(rules)))
}

pub async fn start_admin_server(port: u16, metrics: Arc<Metrics>, rules: Arc<RuleSet>) -> Result<()> {
    let app = admin_router(metrics, rules);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting Admin API on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        crate::error::InterceptError::Network(format!("Failed to bind admin port {}: {}", port, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::InterceptError::Network(format!("Admin server failed: {}", e)))?;

    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn metrics_handler(metrics: Arc<Metrics>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}

async fn rules_handler(rules: Arc<RuleSet>) -> Json<RuleSet> {
    Json(rules.as_ref().clone())
}
