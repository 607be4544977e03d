//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use tenure_core::client::ConnectionState;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: HealthComponents,
    pub tracked_records: usize,
}

#[derive(Serialize)]
pub struct HealthComponents {
    pub store: bool,
    pub gateway: bool,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    let records = state.store.list();
    let store_healthy = records.is_ok();
    let gateway_healthy = state.status.borrow().status == ConnectionState::Ready;

    let status = if store_healthy && gateway_healthy {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: HealthComponents {
            store: store_healthy,
            gateway: gateway_healthy,
        },
        tracked_records: records.map(|r| r.len()).unwrap_or(0),
    })
}
