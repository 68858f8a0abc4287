//! triage_classify: category classification for civic issue submissions.
//!
//! Wraps a previously fitted ensemble-of-trees model behind a serving-path
//! API: fused image+text features in, `(category, confidence)` out. Training
//! lives here too but is an offline concern; the serving process loads the
//! fitted artifacts once at startup and never mutates them.
//!
//! The confidence this crate reports is the forest's vote share on the winning
//! class: posterior probability mass, not a calibrated probability. The
//! low-confidence fallback to [`Category::Other`] is pipeline policy and
//! deliberately absent here: the classifier always reports its raw top
//! prediction.

mod artifacts;
mod classifier;
mod forest;
mod labels;
mod taxonomy;

pub use artifacts::{load_artifacts, save_artifacts, ArtifactError};
pub use classifier::{
    CategoryClassifier, ClassifierConfig, ClassifyError, Prediction, Provenance, TrainingSample,
};
pub use forest::{ForestConfig, RandomForest};
pub use labels::LabelEncoder;
pub use taxonomy::Category;
