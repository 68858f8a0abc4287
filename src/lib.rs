//! Umbrella crate for the civic issue triage pipeline.
//!
//! Stitches the four analyzer stages (category classification, duplicate
//! detection, priority scoring, authenticity verification) into one
//! entry point, [`TriagePipeline::triage`], that turns a decoded submission
//! into a [`TriageVerdict`]. Cross-cutting policy lives here and only here:
//! the low-confidence fallback to the reserved `Other` category, and feeding
//! the duplicate verdict into priority scoring.

mod dataset;
mod pipeline;

pub use dataset::{load_training_records, local_image_path, DatasetError, TrainingRecord};
pub use pipeline::{PipelineConfig, PipelineError, TriagePipeline, TriageVerdict};

pub use triage_authenticity::{
    AuthenticityReport, AuthenticityVerifier, CheckOutcome, FakeHashRegistry, VerifierConfig,
};
pub use triage_classify::{
    load_artifacts, save_artifacts, ArtifactError, Category, CategoryClassifier, ClassifierConfig,
    ClassifyError, Prediction, Provenance, TrainingSample,
};
pub use triage_dedupe::{
    DedupeConfig, DedupeError, DuplicateCorpus, DuplicateQuery, DuplicateVerdict, IssueRecord,
};
pub use triage_features::{
    image_features, image_features_decoded, AcquiredImage, DecodeError, FeatureConfig,
    FeatureVector, FingerprintError, ImageFingerprint, SignalOrigin, TfIdfVectorizer,
};
pub use triage_priority::{PriorityLevel, PriorityScorer, SENSITIVE_KEYWORDS};
