use crate::acquire::acquire_image;
use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use civitriage::{ImageFingerprint, IssueRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Register a previously reported issue into the duplicate corpus.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterIssueRequest {
    pub id: u64,
    pub image_reference: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterIssueResponse {
    pub registered: bool,
    /// Whether the image could be fingerprinted. A record without a
    /// fingerprint still participates in duplicate checks via text and
    /// location.
    pub fingerprinted: bool,
    pub corpus_size: usize,
}

/// Register an image as a known fake in the fingerprint registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFakeRequest {
    pub image_reference: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFakeResponse {
    pub registered: bool,
    pub registry_size: usize,
}

/// Append one issue to the duplicate corpus.
///
/// Fingerprinting failure is tolerated: an unreachable or undecodable image
/// yields a record without a fingerprint, never an error.
pub async fn register_issue(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<RegisterIssueRequest>,
) -> ServerResult<impl IntoResponse> {
    let fingerprint = match acquire_image(&state, &request.image_reference).await {
        Ok(image) => Some(ImageFingerprint::of_image(image.decoded())),
        Err(err) => {
            tracing::warn!(
                id = request.id,
                error = %err,
                "registering issue without fingerprint"
            );
            None
        }
    };

    let fingerprinted = fingerprint.is_some();
    state.pipeline.corpus().register_issue(IssueRecord {
        id: request.id,
        fingerprint,
        description: request.description,
        latitude: request.latitude,
        longitude: request.longitude,
    });

    Ok(Json(RegisterIssueResponse {
        registered: true,
        fingerprinted,
        corpus_size: state.pipeline.corpus().len(),
    }))
}

/// Add an image's fingerprint to the known-fake registry.
///
/// Tolerant of unhashable input: failure to acquire or decode the image is a
/// no-op, reported in the response rather than raised.
pub async fn register_fake(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<RegisterFakeRequest>,
) -> ServerResult<impl IntoResponse> {
    let registered = match acquire_image(&state, &request.image_reference).await {
        Ok(image) => {
            state
                .pipeline
                .registry()
                .register(ImageFingerprint::of_image(image.decoded()));
            true
        }
        Err(err) => {
            tracing::warn!(error = %err, "skipping fake registration of unusable image");
            false
        }
    };

    Ok(Json(RegisterFakeResponse {
        registered,
        registry_size: state.pipeline.registry().len(),
    }))
}
