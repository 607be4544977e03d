//! API route modules.

pub mod health;
pub mod members;
pub mod status;
pub mod sync;

use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tenure_core::Error;

use crate::state::AppState;

/// Create the main router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/members", get(members::list_members))
        .route(
            "/members/{id}",
            put(members::update_member).delete(members::delete_member),
        )
        .route("/status", get(status::connection_status))
        .route("/sync", post(sync::sync_participants));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// JSON error body returned by every handler.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a core error onto an HTTP status.
pub fn core_error(err: Error) -> ApiError {
    let status = match &err {
        Error::NotFound(_) | Error::UnknownMember { .. } => StatusCode::NOT_FOUND,
        Error::InvalidTransition { .. } => StatusCode::CONFLICT,
        Error::NotReady(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, err.to_string())
}
