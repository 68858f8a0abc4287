use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use civitriage::Category;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

/// Health check endpoint (liveness)
///
/// Reports whether a trained classifier is loaded and how many issues the
/// duplicate corpus holds. Returns 200 whenever the server is running; an
/// untrained classifier is degraded mode, not unhealthy.
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let uptime = SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(json!({
        "status": "healthy",
        "service": "triage-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
        "model_loaded": state.pipeline.classifier().is_trained(),
        "corpus_size": state.pipeline.corpus().len(),
    }))
}

/// Readiness check endpoint
pub async fn readiness_check(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let uptime = SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Ok(Json(json!({
        "status": "ready",
        "service": "triage-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
        "components": {
            "api": "ready",
            "classifier": if state.pipeline.classifier().is_trained() { "trained" } else { "untrained" },
            "corpus": "ready",
        }
    })))
}

/// Service statistics: the category taxonomy and the static decision
/// thresholds. Values are configuration, not live tunables.
pub async fn stats(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let dedupe = state.pipeline.corpus().config();
    let categories: Vec<&str> = Category::KNOWN.iter().map(|c| c.label()).collect();

    Ok(Json(json!({
        "category_model": {
            "trained": state.pipeline.classifier().is_trained(),
            "categories": categories,
        },
        "duplicate_detector": {
            "total_issues": state.pipeline.corpus().len(),
            "location_radius_meters": dedupe.radius_m,
            "similarity_threshold": dedupe.similarity_threshold,
        },
        "fake_registry": {
            "known_fakes": state.pipeline.registry().len(),
        },
        "thresholds": {
            "category_confidence": state.pipeline.config().confidence_threshold,
            "duplicate_similarity": dedupe.similarity_threshold,
            "location_radius_meters": dedupe.radius_m,
        }
    })))
}
