use serde::{Deserialize, Serialize};
use thiserror::Error;
use triage_features::ImageFingerprint;

/// One previously reported issue held in the duplicate corpus.
///
/// Immutable once stored. `fingerprint` is `None` when the source image was
/// unhashable at registration time; such records contribute 0 image
/// similarity but still participate in text and distance checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: u64,
    pub fingerprint: Option<ImageFingerprint>,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Matching parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DedupeConfig {
    /// Hard geodesic gate in meters; entries farther away are never
    /// candidates, regardless of visual or textual similarity.
    pub radius_m: f64,
    /// Combined-similarity acceptance threshold in [0, 1].
    pub similarity_threshold: f64,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            radius_m: 100.0,
            similarity_threshold: 0.80,
        }
    }
}

impl DedupeConfig {
    pub fn validate(&self) -> Result<(), DedupeError> {
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(DedupeError::InvalidConfig(format!(
                "radius_m must be positive (got {})",
                self.radius_m
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(DedupeError::InvalidConfig(format!(
                "similarity_threshold must be in [0, 1] (got {})",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

/// A new submission's dedupe-relevant signals.
#[derive(Debug, Clone)]
pub struct DuplicateQuery<'a> {
    /// `None` when the submission image was unhashable; contributes 0 image
    /// similarity rather than an error.
    pub fingerprint: Option<ImageFingerprint>,
    pub description: &'a str,
    pub latitude: f64,
    pub longitude: f64,
}

/// Outcome of a duplicate check.
///
/// `matched_id` names the best-scoring gated candidate even when the combined
/// similarity stays below the acceptance threshold; it is `None` only when no
/// corpus entry passed the distance gate (or scored above zero).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuplicateVerdict {
    pub is_duplicate: bool,
    pub matched_id: Option<u64>,
    pub similarity: f64,
}

impl DuplicateVerdict {
    pub fn not_duplicate() -> Self {
        Self {
            is_duplicate: false,
            matched_id: None,
            similarity: 0.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum DedupeError {
    #[error("invalid dedupe config: {0}")]
    InvalidConfig(String),
}
