//! triage_features: feature extraction for civic issue submissions.
//!
//! This crate turns a raw submission into the fixed-length descriptors the
//! downstream analyzers consume: a 99-dimension color-histogram vector for the
//! image, a TF-IDF projection for the description text, and a 64-bit
//! average-hash fingerprint for approximate image similarity. It is
//! configuration-driven and free of I/O: callers hand it bytes or an already
//! decoded image.
//!
//! Extraction failures never abort a submission. Every produced vector carries
//! a [`SignalOrigin`] so callers and tests can tell a genuine zero signal from
//! a decode-failure fallback.

mod acquired;
mod config;
mod fingerprint;
mod histogram;
mod vectorizer;

pub use acquired::{AcquiredImage, DecodeError};
pub use config::FeatureConfig;
pub use fingerprint::{FingerprintError, ImageFingerprint, FINGERPRINT_BITS};
pub use histogram::{image_features, image_features_decoded, IMAGE_FEATURE_DIM};
pub use vectorizer::{cosine_similarity, tokenize, TfIdfVectorizer};

use serde::{Deserialize, Serialize};

/// Where a feature vector came from.
///
/// `Observed` vectors measured real input. The fallback variants are the
/// documented degraded modes: an all-zero vector that must be treated as
/// "no signal", never as a valid observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalOrigin {
    /// Extracted from actual input.
    Observed,
    /// Image bytes failed to decode; the vector is all zeros.
    DecodeFallback,
    /// The lexical vectorizer has not been fitted yet; the vector is all zeros.
    UnfittedFallback,
}

/// A fixed-length numeric descriptor plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: Vec<f32>,
    pub origin: SignalOrigin,
}

impl FeatureVector {
    pub fn observed(values: Vec<f32>) -> Self {
        Self {
            values,
            origin: SignalOrigin::Observed,
        }
    }

    /// An all-zero vector of `dim` values with the given fallback origin.
    pub fn zeroed(dim: usize, origin: SignalOrigin) -> Self {
        Self {
            values: vec![0.0; dim],
            origin,
        }
    }

    /// True when this vector is a documented fallback rather than a real
    /// observation.
    pub fn is_degraded(&self) -> bool {
        self.origin != SignalOrigin::Observed
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
