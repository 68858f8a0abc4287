use crate::acquire::acquire_image;
use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use civitriage::{PriorityLevel, TriageVerdict};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One citizen submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageRequest {
    /// URL, `file://` URL, or local path of the issue photo.
    pub image_reference: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// The triage verdict as served to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageResponse {
    pub category: String,
    /// Classifier confidence rounded to 2 decimals.
    pub confidence: f64,
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_issue_id: Option<u64>,
    pub priority: PriorityLevel,
    pub authentic: bool,
}

impl From<TriageVerdict> for TriageResponse {
    fn from(verdict: TriageVerdict) -> Self {
        Self {
            category: verdict.category.label().to_string(),
            confidence: round2(verdict.category_confidence),
            is_duplicate: verdict.is_duplicate,
            duplicate_issue_id: verdict.duplicate_issue_id,
            priority: verdict.priority,
            authentic: verdict.is_authentic,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Triage one submission end-to-end.
///
/// Acquires and decodes the referenced image, then runs the four-stage
/// pipeline (classify → dedupe → prioritize → verify) against that single
/// decoded instance. Acquisition failure is the only per-request fatal
/// condition; every heuristic inside the pipeline degrades gracefully.
pub async fn triage_submission(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<TriageRequest>,
) -> ServerResult<impl IntoResponse> {
    validate(&request)?;

    let image = acquire_image(&state, &request.image_reference).await?;

    let verdict = state.pipeline.triage(
        &image,
        &request.description,
        request.latitude,
        request.longitude,
    )?;

    Ok(Json(TriageResponse::from(verdict)))
}

fn validate(request: &TriageRequest) -> ServerResult<()> {
    if request.image_reference.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "imageReference must not be empty".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&request.latitude) {
        return Err(ServerError::BadRequest(format!(
            "latitude out of range: {}",
            request.latitude
        )));
    }
    if !(-180.0..=180.0).contains(&request.longitude) {
        return Err(ServerError::BadRequest(format!(
            "longitude out of range: {}",
            request.longitude
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(lat: f64, lon: f64) -> TriageRequest {
        TriageRequest {
            image_reference: "file:///tmp/x.jpg".to_string(),
            description: "pothole".to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn coordinates_are_range_checked() {
        assert!(validate(&request(28.6, 77.2)).is_ok());
        assert!(validate(&request(91.0, 0.0)).is_err());
        assert!(validate(&request(0.0, -181.0)).is_err());
    }

    #[test]
    fn empty_reference_is_rejected() {
        let mut req = request(0.0, 0.0);
        req.image_reference = "  ".to_string();
        assert!(validate(&req).is_err());
    }

    #[test]
    fn confidence_rounds_to_two_decimals() {
        assert_eq!(round2(0.666_666), 0.67);
        assert_eq!(round2(0.5), 0.5);
        assert_eq!(round2(1.0), 1.0);
    }
}
