use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One labeled record in the offline training dataset.
///
/// Doubles as the duplicate-corpus bootstrap format: the server loads the
/// same file at startup to seed previously known issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRecord {
    pub id: u64,
    /// URL, `file://` URL, or local path of the issue photo.
    pub image_reference: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Category label string; resolved against the taxonomy when used.
    pub category: String,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("could not read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse dataset {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load an ordered training dataset from a JSON array file.
pub fn load_training_records(path: &Path) -> Result<Vec<TrainingRecord>, DatasetError> {
    let raw = std::fs::read(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<TrainingRecord> =
        serde_json::from_slice(&raw).map_err(|source| DatasetError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!(path = %path.display(), records = records.len(), "training dataset loaded");
    Ok(records)
}

/// Resolve an image reference to a local filesystem path, if it is one.
///
/// `file://` URLs and bare paths resolve; `http(s)://` references do not,
/// since those need the server's download path.
pub fn local_image_path(reference: &str) -> Option<PathBuf> {
    if let Some(stripped) = reference.strip_prefix("file://") {
        return Some(PathBuf::from(stripped));
    }
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return None;
    }
    Some(PathBuf::from(reference))
}
