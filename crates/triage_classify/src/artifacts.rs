use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use thiserror::Error;
use triage_features::TfIdfVectorizer;

use crate::classifier::{CategoryClassifier, ClassifierConfig};
use crate::forest::RandomForest;
use crate::labels::LabelEncoder;

/// File names of the three persisted model blobs, one per trained component.
const FOREST_FILE: &str = "forest.bin";
const VECTORIZER_FILE: &str = "vectorizer.bin";
const LABELS_FILE: &str = "labels.bin";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("cannot persist an untrained classifier")]
    Untrained,
}

/// Persist a trained classifier as three bincode blobs under `dir`.
pub fn save_artifacts(classifier: &CategoryClassifier, dir: &Path) -> Result<(), ArtifactError> {
    let config = classifier.config().clone();
    let (forest, vectorizer, labels) = classifier.clone().into_parts();
    let forest = forest.ok_or(ArtifactError::Untrained)?;

    std::fs::create_dir_all(dir)?;
    write_blob(&dir.join(FOREST_FILE), &forest)?;
    write_blob(&dir.join(VECTORIZER_FILE), &vectorizer)?;
    write_blob(&dir.join(LABELS_FILE), &labels)?;

    tracing::info!(dir = %dir.display(), config = ?config, "classifier artifacts saved");
    Ok(())
}

/// Load a trained classifier from the three blobs under `dir`.
///
/// All three must be present and decodable; callers that want a degraded
/// startup fall back to [`CategoryClassifier::untrained`] on error.
pub fn load_artifacts(dir: &Path, config: ClassifierConfig) -> Result<CategoryClassifier, ArtifactError> {
    let forest: RandomForest = read_blob(&dir.join(FOREST_FILE))?;
    let vectorizer: TfIdfVectorizer = read_blob(&dir.join(VECTORIZER_FILE))?;
    let labels: LabelEncoder = read_blob(&dir.join(LABELS_FILE))?;

    tracing::info!(
        dir = %dir.display(),
        classes = labels.len(),
        features = forest.n_features(),
        "classifier artifacts loaded"
    );
    Ok(CategoryClassifier::from_parts(
        Some(forest),
        vectorizer,
        labels,
        config,
    ))
}

fn write_blob<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let file = BufWriter::new(File::create(path)?);
    bincode::serialize_into(file, value)?;
    Ok(())
}

fn read_blob<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let file = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(file)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TrainingSample;
    use crate::taxonomy::Category;

    fn trained() -> CategoryClassifier {
        let samples: Vec<TrainingSample> = (0..8)
            .map(|i| TrainingSample {
                image_features: vec![i as f32 * 0.1, 1.0 - i as f32 * 0.1],
                description: if i % 2 == 0 {
                    "stagnant water leaking across the footpath".to_string()
                } else {
                    "street light flickering all night".to_string()
                },
                category: if i % 2 == 0 {
                    Category::WaterLeakage
                } else {
                    Category::StreetLight
                },
            })
            .collect();
        CategoryClassifier::train(&samples, ClassifierConfig::default()).expect("train")
    }

    #[test]
    fn save_load_roundtrip_preserves_predictions() {
        let classifier = trained();
        let dir = tempfile::tempdir().expect("tempdir");

        save_artifacts(&classifier, dir.path()).expect("save");
        let restored =
            load_artifacts(dir.path(), ClassifierConfig::default()).expect("load");

        assert_eq!(restored, classifier);

        let text = classifier.text_features("street light flickering all night");
        let before = classifier.predict(&[0.1, 0.9], &text.values).expect("pre");
        let after = restored.predict(&[0.1, 0.9], &text.values).expect("post");
        assert_eq!(before, after);
    }

    #[test]
    fn untrained_classifier_cannot_be_saved() {
        let classifier = CategoryClassifier::untrained(ClassifierConfig::default());
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            save_artifacts(&classifier, dir.path()),
            Err(ArtifactError::Untrained)
        ));
    }

    #[test]
    fn missing_artifacts_error_cleanly() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_artifacts(dir.path(), ClassifierConfig::default()).is_err());
    }
}
