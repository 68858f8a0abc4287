//! triage_authenticity: is the submitted photo a real capture?
//!
//! Three independent heuristics (embedded capture metadata, a known-fake
//! fingerprint registry, file-property sanity) each vote pass/fail with
//! a diagnostic message. The verdict is the strict majority: two failing
//! checks sink a photo, one alone never does. None of this is anti-spoofing;
//! it is a cheap screen for stock photos, screenshots, and thumbnails.

mod registry;
mod verifier;

pub use registry::FakeHashRegistry;
pub use verifier::{AuthenticityReport, AuthenticityVerifier, CheckOutcome, VerifierConfig};
