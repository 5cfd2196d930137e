//! API route handlers
//!
//! - `health`: liveness, readiness, metrics and server metadata
//! - `companies`: company search and registry maintenance

pub mod companies;
pub mod health;

use crate::error::ServerError;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// This is the root endpoint (GET /) and requires no authentication.
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "corpmatch server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "GET /api/v1/companies",
            "POST /api/v1/companies",
            "GET /api/v1/companies/{id}",
            "PATCH /api/v1/companies/{id}",
            "DELETE /api/v1/companies/{id}",
            "/health",
            "/ready",
            "/metrics"
        ]
    }))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
