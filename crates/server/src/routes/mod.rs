//! API route handlers
//!
//! - `health`: Health checks, readiness, and service statistics
//! - `triage`: The triage endpoint (the whole point of the server)
//! - `registry`: Corpus and fake-hash registry maintenance

pub mod health;
pub mod registry;
pub mod triage;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Returns server information including version and available endpoints.
/// This is the root endpoint (GET /) and requires no authentication.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Civic Issue Triage Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/triage",
            "/api/v1/issues/register",
            "/api/v1/fakes/register",
            "/api/v1/stats",
            "/health",
            "/ready"
        ]
    })))
}

/// 404 Not Found handler for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
