use std::io::Cursor;
use std::sync::Arc;

use exif::{In, Tag};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use triage_features::{AcquiredImage, ImageFingerprint};

use crate::registry::FakeHashRegistry;

/// Decoded formats accepted as plausible phone-camera output.
const ACCEPTED_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png];

/// File-property floors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Minimum width/height; anything smaller smells like a downloaded
    /// thumbnail.
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            min_width: 400,
            min_height: 400,
        }
    }
}

/// One heuristic check's pass/fail plus its diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub passed: bool,
    pub message: String,
}

impl CheckOutcome {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

/// Aggregate authenticity verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticityReport {
    pub authentic: bool,
    /// Unweighted mean of the three check outcomes.
    pub confidence: f64,
    /// Per-check diagnostics in fixed order: metadata, fingerprint, file
    /// properties.
    pub checks: Vec<CheckOutcome>,
}

/// Runs the three authenticity checks against one acquired image.
#[derive(Debug, Clone)]
pub struct AuthenticityVerifier {
    config: VerifierConfig,
    registry: Arc<FakeHashRegistry>,
}

impl AuthenticityVerifier {
    pub fn new(registry: Arc<FakeHashRegistry>) -> Self {
        Self::with_config(registry, VerifierConfig::default())
    }

    pub fn with_config(registry: Arc<FakeHashRegistry>, config: VerifierConfig) -> Self {
        Self { config, registry }
    }

    pub fn registry(&self) -> &Arc<FakeHashRegistry> {
        &self.registry
    }

    /// Run all three checks and fold them into a verdict.
    ///
    /// Confidence is the unweighted mean of the boolean outcomes; the image
    /// is authentic iff strictly more than half the checks pass, so a single
    /// failing check alone is never disqualifying.
    pub fn verify(&self, image: &AcquiredImage) -> AuthenticityReport {
        let fingerprint = Some(ImageFingerprint::of_image(image.decoded()));

        let checks = vec![
            check_metadata(image.bytes()),
            self.check_fingerprint(fingerprint),
            self.check_file_properties(image),
        ];

        let passed = checks.iter().filter(|check| check.passed).count();
        let confidence = passed as f64 / checks.len() as f64;
        let report = AuthenticityReport {
            authentic: confidence > 0.5,
            confidence,
            checks,
        };
        tracing::debug!(
            authentic = report.authentic,
            confidence = report.confidence,
            "authenticity verified"
        );
        report
    }

    /// Fingerprint blacklist check. An unhashable image gets the benefit of
    /// the doubt, since fraud cannot be proven from an undecodable file, but the
    /// pass is annotated as low-confidence.
    fn check_fingerprint(&self, fingerprint: Option<ImageFingerprint>) -> CheckOutcome {
        match fingerprint {
            Some(fp) if self.registry.contains(fp) => {
                CheckOutcome::fail("matches a known stock/fake image")
            }
            Some(_) => CheckOutcome::pass("unique image hash"),
            None => CheckOutcome::pass("could not hash image; passing with low confidence"),
        }
    }

    /// Resolution floor and container format sanity.
    fn check_file_properties(&self, image: &AcquiredImage) -> CheckOutcome {
        let (width, height) = image.dimensions();
        if width < self.config.min_width || height < self.config.min_height {
            return CheckOutcome::fail(format!(
                "low resolution ({width}x{height}), might be a downloaded thumbnail"
            ));
        }

        match image.format() {
            Some(format) if ACCEPTED_FORMATS.contains(&format) => {
                CheckOutcome::pass("file properties acceptable")
            }
            Some(format) => CheckOutcome::fail(format!("unusual format: {format:?}")),
            None => CheckOutcome::fail("unrecognized container format"),
        }
    }
}

/// EXIF capture-metadata check.
///
/// A geotag plus an original-capture timestamp is the strongest signal of a
/// real capture; either alone still passes. No metadata at all is the normal
/// shape of screenshots and downloads: suspicious, so this check fails, but
/// not fatal on its own.
fn check_metadata(bytes: &[u8]) -> CheckOutcome {
    let mut cursor = Cursor::new(bytes);
    let exif = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif,
        Err(err) => return CheckOutcome::fail(format!("no EXIF metadata ({err})")),
    };

    let has_gps = exif.get_field(Tag::GPSLatitude, In::PRIMARY).is_some()
        || exif.get_field(Tag::GPSLongitude, In::PRIMARY).is_some();
    let has_timestamp = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY).is_some();

    match (has_gps, has_timestamp) {
        (true, true) => CheckOutcome::pass("has GPS and timestamp metadata"),
        (true, false) | (false, true) => CheckOutcome::pass("has partial capture metadata"),
        (false, false) => CheckOutcome::fail("missing GPS and timestamp metadata"),
    }
}
