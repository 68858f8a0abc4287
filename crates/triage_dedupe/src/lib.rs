//! triage_dedupe: duplicate detection over previously reported issues.
//!
//! Maintains an in-memory corpus of known issues (location, perceptual
//! fingerprint, description) and decides whether a new submission re-reports
//! one of them. The decision fuses three signals in a fixed order: a hard
//! geodesic distance gate, perceptual-hash similarity, and lexical cosine
//! similarity, combined as `0.6 × image + 0.4 × text`.
//!
//! The weights, the 100 m radius, and the 0.80 acceptance threshold are
//! behavioral contract; changing them changes which reports the city crew
//! skips.

mod engine;
mod geo;
mod types;

pub use engine::DuplicateCorpus;
pub use geo::haversine_m;
pub use types::{DedupeConfig, DedupeError, DuplicateQuery, DuplicateVerdict, IssueRecord};
