use serde::{Deserialize, Serialize};
use thiserror::Error;
use triage_features::{FeatureVector, TfIdfVectorizer};

use crate::forest::{ForestConfig, RandomForest};
use crate::labels::LabelEncoder;
use crate::taxonomy::Category;

/// Classifier training/serving configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Cap on the description vocabulary; fixes the text feature dimension.
    pub vocabulary_size: usize,
    pub forest: ForestConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            vocabulary_size: 100,
            forest: ForestConfig::default(),
        }
    }
}

/// One labeled training example: precomputed image features plus the raw
/// description (the text vectorizer is fitted as part of training).
#[derive(Debug, Clone)]
pub struct TrainingSample {
    pub image_features: Vec<f32>,
    pub description: String,
    pub category: Category,
}

/// Whether a prediction came from a fitted model or the untrained safe
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Trained,
    /// No model is loaded; the prediction is the documented safe default
    /// (lowest-severity category, neutral confidence) and must not be
    /// mistaken for a real classification.
    UntrainedDefault,
}

/// A raw classifier prediction. The low-confidence override to
/// [`Category::Other`] is applied by the orchestrator, never here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub category: Category,
    /// Vote share of the winning class in [0, 1]. Uncalibrated.
    pub confidence: f64,
    pub provenance: Provenance,
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("training dataset is empty or label count does not match samples")]
    EmptyDataset,

    #[error("feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("model state is corrupt: class index {0} has no category")]
    CorruptModel(usize),
}

/// Serving-path category classifier.
///
/// Holds the fitted forest, the description vectorizer, and the label
/// alphabet. Read-only after construction; safe to share across concurrent
/// submissions behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryClassifier {
    forest: Option<RandomForest>,
    vectorizer: TfIdfVectorizer,
    labels: LabelEncoder,
    config: ClassifierConfig,
}

impl CategoryClassifier {
    /// A classifier with no fitted model. `predict` degrades to the safe
    /// default until trained artifacts are loaded.
    pub fn untrained(config: ClassifierConfig) -> Self {
        let vocabulary_size = config.vocabulary_size;
        Self {
            forest: None,
            vectorizer: TfIdfVectorizer::new(Some(vocabulary_size)),
            labels: LabelEncoder::default(),
            config,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.forest.is_some()
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Project a description through the classifier's own vectorizer.
    /// Unfitted vectorizer → zero vector with the fallback marker.
    pub fn text_features(&self, description: &str) -> FeatureVector {
        self.vectorizer.transform(description)
    }

    /// Predict a category from fused image+text features.
    ///
    /// Untrained: returns the taxonomy's lowest-severity category with a
    /// neutral 0.5 confidence, flagged [`Provenance::UntrainedDefault`] and
    /// logged as a degraded-mode condition. A fused dimension that disagrees
    /// with the trained model is an invariant violation, not a degrade.
    pub fn predict(
        &self,
        image_features: &[f32],
        text_features: &[f32],
    ) -> Result<Prediction, ClassifyError> {
        let Some(forest) = &self.forest else {
            tracing::warn!("classifier not trained, returning safe default prediction");
            return Ok(Prediction {
                category: Category::Garbage,
                confidence: 0.5,
                provenance: Provenance::UntrainedDefault,
            });
        };

        let fused_len = image_features.len() + text_features.len();
        if fused_len != forest.n_features() {
            return Err(ClassifyError::DimensionMismatch {
                expected: forest.n_features(),
                actual: fused_len,
            });
        }

        let mut fused = Vec::with_capacity(fused_len);
        fused.extend_from_slice(image_features);
        fused.extend_from_slice(text_features);

        let proba = forest.predict_proba(&fused);
        let (class, confidence) = proba
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(class, &p)| (class, p))
            .unwrap_or((0, 0.0));

        let category = self
            .labels
            .decode(class)
            .ok_or(ClassifyError::CorruptModel(class))?;

        Ok(Prediction {
            category,
            confidence,
            provenance: Provenance::Trained,
        })
    }

    /// Fit the vectorizer, label alphabet, and forest on labeled samples.
    pub fn train(
        samples: &[TrainingSample],
        config: ClassifierConfig,
    ) -> Result<Self, ClassifyError> {
        if samples.is_empty() {
            return Err(ClassifyError::EmptyDataset);
        }

        let descriptions: Vec<&str> = samples.iter().map(|s| s.description.as_str()).collect();
        let mut vectorizer = TfIdfVectorizer::new(Some(config.vocabulary_size));
        vectorizer.fit(&descriptions);

        let categories: Vec<Category> = samples.iter().map(|s| s.category).collect();
        let labels = LabelEncoder::fit(&categories);

        let x: Vec<Vec<f32>> = samples
            .iter()
            .map(|s| {
                let mut fused = s.image_features.clone();
                fused.extend(vectorizer.transform(&s.description).values);
                fused
            })
            .collect();
        let y: Vec<usize> = categories
            .iter()
            .map(|&c| labels.encode(c).expect("label alphabet covers all samples"))
            .collect();

        let forest = RandomForest::fit(&x, &y, labels.len(), &config.forest)?;
        tracing::info!(
            samples = samples.len(),
            classes = labels.len(),
            features = forest.n_features(),
            trees = forest.n_trees(),
            "category classifier trained"
        );

        Ok(Self {
            forest: Some(forest),
            vectorizer,
            labels,
            config,
        })
    }

    pub(crate) fn into_parts(self) -> (Option<RandomForest>, TfIdfVectorizer, LabelEncoder) {
        (self.forest, self.vectorizer, self.labels)
    }

    pub(crate) fn from_parts(
        forest: Option<RandomForest>,
        vectorizer: TfIdfVectorizer,
        labels: LabelEncoder,
        config: ClassifierConfig,
    ) -> Self {
        Self {
            forest,
            vectorizer,
            labels,
            config,
        }
    }
}
