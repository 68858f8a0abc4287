use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use triage_features::ImageFingerprint;

/// Append-only set of perceptual fingerprints of known stock/reused images.
///
/// Shared mutable state: registrations and membership checks are serialized
/// through an interior reader-writer lock. Nothing is ever removed.
#[derive(Debug, Default)]
pub struct FakeHashRegistry {
    inner: RwLock<HashSet<ImageFingerprint>>,
}

impl FakeHashRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a known-fake fingerprint.
    pub fn register(&self, fingerprint: ImageFingerprint) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.insert(fingerprint);
        tracing::debug!(registry_size = inner.len(), "fake fingerprint registered");
    }

    /// Register from raw image bytes. Tolerant of unhashable input: an image
    /// we cannot hash cannot be matched later either, so failure is a logged
    /// no-op, never an error. Returns whether anything was registered.
    pub fn register_bytes(&self, bytes: &[u8]) -> bool {
        match ImageFingerprint::from_bytes(bytes) {
            Ok(fingerprint) => {
                self.register(fingerprint);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping fake registration of unhashable image");
                false
            }
        }
    }

    pub fn contains(&self, fingerprint: ImageFingerprint) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&fingerprint)
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
