//! Gateway connection status endpoint.

use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use tenure_core::client::ClientStatus;

use crate::state::AppState;

/// GET /api/status - current connection state and pairing QR, if any.
pub async fn connection_status(State(state): State<Arc<AppState>>) -> Json<ClientStatus> {
    Json(state.status.borrow().clone())
}
