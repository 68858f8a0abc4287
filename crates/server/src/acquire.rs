//! Image acquisition: resolve an `imageReference` to one decoded image.
//!
//! The only I/O-bound step of a submission. Runs to completion before the
//! pipeline starts, so the core analyzers never block on the network. Any
//! failure here (unreachable URL, unreadable file, undecodable bytes) is
//! fatal for the whole submission and surfaces as a client-facing error.

use std::path::Path;

use triage_features::AcquiredImage;

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;

/// Resolve `reference` (http/https URL, `file://` URL, or local path) to a
/// decoded image.
pub async fn acquire_image(state: &ServerState, reference: &str) -> ServerResult<AcquiredImage> {
    let bytes = if reference.starts_with("http://") || reference.starts_with("https://") {
        download(state, reference).await?
    } else {
        let path = reference.strip_prefix("file://").unwrap_or(reference);
        read_local(path).await?
    };

    AcquiredImage::from_bytes(bytes)
        .map_err(|err| ServerError::Acquisition(format!("could not decode {reference}: {err}")))
}

async fn download(state: &ServerState, url: &str) -> ServerResult<Vec<u8>> {
    let response = state
        .http
        .get(url)
        .send()
        .await
        .map_err(|err| ServerError::Acquisition(format!("could not download {url}: {err}")))?;

    let response = response
        .error_for_status()
        .map_err(|err| ServerError::Acquisition(format!("could not download {url}: {err}")))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|err| ServerError::Acquisition(format!("could not read {url}: {err}")))?;
    Ok(bytes.to_vec())
}

async fn read_local(path: &str) -> ServerResult<Vec<u8>> {
    tokio::fs::read(Path::new(path))
        .await
        .map_err(|err| ServerError::Acquisition(format!("could not read {path}: {err}")))
}
