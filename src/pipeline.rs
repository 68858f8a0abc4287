use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use triage_authenticity::{AuthenticityReport, AuthenticityVerifier, FakeHashRegistry};
use triage_classify::{Category, CategoryClassifier, ClassifyError};
use triage_dedupe::{DuplicateCorpus, DuplicateQuery};
use triage_features::{image_features_decoded, AcquiredImage, FeatureConfig, ImageFingerprint};
use triage_priority::{PriorityLevel, PriorityScorer};

/// Pipeline-level policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Below this classifier confidence the category label is overridden to
    /// the reserved `Other` fallback. The raw confidence is still reported.
    pub confidence_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.70,
        }
    }
}

/// The externally visible result of triaging one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageVerdict {
    /// Possibly the `Other` fallback when raw confidence fell below the
    /// threshold.
    pub category: Category,
    /// The classifier's raw confidence, unmodified by the fallback override.
    pub category_confidence: f64,
    pub is_duplicate: bool,
    /// Best gated duplicate candidate, present even below the acceptance
    /// threshold.
    pub duplicate_issue_id: Option<u64>,
    pub duplicate_similarity: f64,
    pub priority: PriorityLevel,
    pub is_authentic: bool,
    pub authenticity: AuthenticityReport,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("classification failed: {0}")]
    Classify(#[from] ClassifyError),
}

/// Sequences the four analyzers for one submission.
///
/// The classifier is read-only after startup; the duplicate corpus and fake
/// registry synchronize internally. One pipeline instance is shared across
/// all concurrent submissions.
pub struct TriagePipeline {
    classifier: Arc<CategoryClassifier>,
    corpus: Arc<DuplicateCorpus>,
    scorer: PriorityScorer,
    verifier: AuthenticityVerifier,
    features: FeatureConfig,
    config: PipelineConfig,
}

impl TriagePipeline {
    pub fn new(
        classifier: Arc<CategoryClassifier>,
        corpus: Arc<DuplicateCorpus>,
        registry: Arc<FakeHashRegistry>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            classifier,
            corpus,
            scorer: PriorityScorer::new(),
            verifier: AuthenticityVerifier::new(registry),
            features: FeatureConfig::default(),
            config,
        }
    }

    pub fn classifier(&self) -> &Arc<CategoryClassifier> {
        &self.classifier
    }

    pub fn corpus(&self) -> &Arc<DuplicateCorpus> {
        &self.corpus
    }

    pub fn registry(&self) -> &Arc<FakeHashRegistry> {
        self.verifier.registry()
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    /// Triage one submission. All four stages observe the same decoded image.
    ///
    /// Stage order matters only where data flows: the duplicate verdict feeds
    /// priority scoring, and the category override must happen before
    /// priority scoring but after the raw prediction. Authenticity is
    /// independent of the other three.
    pub fn triage(
        &self,
        image: &AcquiredImage,
        description: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<TriageVerdict, PipelineError> {
        // 1. Category.
        let image_vec = image_features_decoded(image.decoded(), &self.features);
        let text_vec = self.classifier.text_features(description);
        let prediction = self.classifier.predict(&image_vec, &text_vec.values)?;

        let category = if prediction.confidence < self.config.confidence_threshold {
            tracing::debug!(
                raw_category = %prediction.category,
                confidence = prediction.confidence,
                threshold = self.config.confidence_threshold,
                "confidence below threshold, falling back to Other"
            );
            Category::Other
        } else {
            prediction.category
        };

        // 2. Duplicate detection. Never consults the category.
        let fingerprint = Some(ImageFingerprint::of_image(image.decoded()));
        let duplicate = self.corpus.check(&DuplicateQuery {
            fingerprint,
            description,
            latitude,
            longitude,
        });

        // 3. Priority, from the possibly-overridden category and the
        //    duplicate verdict.
        let priority = self
            .scorer
            .assign(category, description, duplicate.is_duplicate);

        // 4. Authenticity, independent of 1–3.
        let authenticity = self.verifier.verify(image);

        tracing::info!(
            category = %category,
            confidence = prediction.confidence,
            is_duplicate = duplicate.is_duplicate,
            priority = %priority,
            authentic = authenticity.authentic,
            "submission triaged"
        );

        Ok(TriageVerdict {
            category,
            category_confidence: prediction.confidence,
            is_duplicate: duplicate.is_duplicate,
            duplicate_issue_id: duplicate.matched_id,
            duplicate_similarity: duplicate.similarity,
            priority,
            is_authentic: authenticity.authentic,
            authenticity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use triage_classify::{ClassifierConfig, TrainingSample};
    use triage_dedupe::{DedupeConfig, IssueRecord};

    fn acquired(width: u32, height: u32, tint: u8) -> AcquiredImage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                ((x + tint as u32 * 13) % 256) as u8,
                ((y * 2 + tint as u32) % 256) as u8,
                tint,
            ])
        }));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).expect("encode");
        AcquiredImage::from_bytes(out.into_inner()).expect("decode")
    }

    fn untrained_pipeline() -> TriagePipeline {
        TriagePipeline::new(
            Arc::new(CategoryClassifier::untrained(ClassifierConfig::default())),
            Arc::new(DuplicateCorpus::new(DedupeConfig::default()).expect("config")),
            Arc::new(FakeHashRegistry::new()),
            PipelineConfig::default(),
        )
    }

    #[test]
    fn untrained_confidence_falls_back_to_other() {
        let pipeline = untrained_pipeline();
        let image = acquired(512, 512, 40);

        let verdict = pipeline
            .triage(&image, "deep pothole on elm street", 28.6139, 77.2090)
            .expect("triage");

        // Raw prediction is (Garbage Issue, 0.5); 0.5 < 0.70 so the label is
        // overridden while the raw confidence is reported untouched.
        assert_eq!(verdict.category, Category::Other);
        assert_eq!(verdict.category_confidence, 0.5);
    }

    #[test]
    fn duplicate_raises_priority() {
        let pipeline = untrained_pipeline();
        let image = acquired(512, 512, 40);
        let fingerprint = ImageFingerprint::of_image(image.decoded());

        pipeline.corpus().register_issue(IssueRecord {
            id: 42,
            fingerprint: Some(fingerprint),
            description: "garbage dumped by the school entrance".to_string(),
            latitude: 28.6139,
            longitude: 77.2090,
        });

        let verdict = pipeline
            .triage(
                &image,
                "garbage dumped by the school entrance",
                28.6139,
                77.2090,
            )
            .expect("triage");

        assert!(verdict.is_duplicate);
        assert_eq!(verdict.duplicate_issue_id, Some(42));
        // Other (severity 2) + sensitive ("school") + duplicate → 4 → High.
        assert_eq!(verdict.priority, PriorityLevel::High);
    }

    #[test]
    fn empty_corpus_is_never_duplicate() {
        let pipeline = untrained_pipeline();
        let image = acquired(512, 512, 10);

        let verdict = pipeline
            .triage(&image, "standing water near the gate", 28.6139, 77.2090)
            .expect("triage");

        assert!(!verdict.is_duplicate);
        assert_eq!(verdict.duplicate_issue_id, None);
        assert_eq!(verdict.duplicate_similarity, 0.0);
        // Other (severity 2), no boosts → Low.
        assert_eq!(verdict.priority, PriorityLevel::Low);
    }

    #[test]
    fn high_confidence_prediction_keeps_its_label() {
        let mut samples = Vec::new();
        for i in 0..12 {
            let jitter = i as f32 * 0.001;
            samples.push(TrainingSample {
                image_features: vec![0.8 - jitter; 99],
                description: "sewage overflow flooding the lane".to_string(),
                category: Category::SewerOverflow,
            });
            samples.push(TrainingSample {
                image_features: vec![0.1 + jitter; 99],
                description: "street light dark at night".to_string(),
                category: Category::StreetLight,
            });
        }
        let classifier =
            CategoryClassifier::train(&samples, ClassifierConfig::default()).expect("train");

        let text = classifier.text_features("sewage overflow flooding the lane");
        let prediction = classifier
            .predict(&vec![0.8f32; 99], &text.values)
            .expect("predict");
        assert_eq!(prediction.category, Category::SewerOverflow);
        assert!(prediction.confidence >= 0.70);

        // Fed through the scorer the way the orchestrator does it.
        let scorer = PriorityScorer::new();
        assert_eq!(
            scorer.assign(prediction.category, "sewage overflow flooding the lane", false),
            PriorityLevel::High
        );
    }

    #[test]
    fn authenticity_is_independent_of_other_stages() {
        let pipeline = untrained_pipeline();
        let image = acquired(100, 100, 77);

        let verdict = pipeline
            .triage(&image, "anything", 0.0, 0.0)
            .expect("triage");

        // Tiny PNG with no EXIF: metadata and resolution fail → inauthentic,
        // while the rest of the verdict is still produced.
        assert!(!verdict.is_authentic);
        assert_eq!(verdict.authenticity.checks.len(), 3);
        assert_eq!(verdict.category, Category::Other);
    }
}
