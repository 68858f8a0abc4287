use std::sync::Arc;

use civitriage::{
    load_artifacts, load_training_records, local_image_path, CategoryClassifier, ClassifierConfig,
    FakeHashRegistry, ImageFingerprint, IssueRecord, PipelineConfig, TriagePipeline,
};
use dashmap::DashMap;
use triage_dedupe::{DedupeConfig, DuplicateCorpus};

use crate::config::ServerConfig;
use crate::error::ServerResult;

/// Shared application state
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Rate limit tracking: API key -> (count, window_start)
    pub rate_limiter: DashMap<String, (u32, std::time::Instant)>,

    /// The triage pipeline (classifier, corpus, registry, scorer, verifier)
    pub pipeline: TriagePipeline,

    /// HTTP client for image downloads
    pub http: reqwest::Client,
}

impl ServerState {
    /// Create new server state.
    ///
    /// Loads the trained classifier artifacts if present (degrading to the
    /// untrained safe-default classifier otherwise) and bootstraps the
    /// duplicate corpus from the training dataset when the file exists.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let classifier = match load_artifacts(&config.model_dir, ClassifierConfig::default()) {
            Ok(classifier) => Arc::new(classifier),
            Err(err) => {
                tracing::warn!(
                    model_dir = %config.model_dir.display(),
                    error = %err,
                    "no trained model found, serving untrained safe defaults; run `train` first"
                );
                Arc::new(CategoryClassifier::untrained(ClassifierConfig::default()))
            }
        };

        let corpus = Arc::new(DuplicateCorpus::new(DedupeConfig::default())?);
        if config.dataset_path.exists() {
            match load_training_records(&config.dataset_path) {
                Ok(records) => {
                    let issues = records.into_iter().map(issue_from_record).collect();
                    corpus.load_records(issues);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "duplicate corpus bootstrap failed, starting empty");
                }
            }
        } else {
            tracing::info!(
                dataset = %config.dataset_path.display(),
                "no dataset file, duplicate corpus starts empty"
            );
        }

        let registry = Arc::new(FakeHashRegistry::new());
        let pipeline = TriagePipeline::new(classifier, corpus, registry, PipelineConfig::default());

        let http = reqwest::Client::builder()
            .timeout(config.download_timeout())
            .build()
            .map_err(|err| crate::error::ServerError::Config(err.to_string()))?;

        Ok(Self {
            config: Arc::new(config),
            rate_limiter: DashMap::new(),
            pipeline,
            http,
        })
    }

    /// Check if API key is valid
    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }

    /// Check rate limit for API key
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = std::time::Instant::now();
        let window = std::time::Duration::from_secs(60);
        let limit = self.config.rate_limit_per_minute;

        let mut entry = self.rate_limiter.entry(key.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        // Reset if window has passed
        if now.duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }

        // Check limit
        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }
}

/// Build a corpus entry from a dataset record, fingerprinting the image when
/// it resolves to a readable local file. Unhashable or remote images are
/// stored without a fingerprint rather than rejected.
fn issue_from_record(record: civitriage::TrainingRecord) -> IssueRecord {
    let fingerprint = local_image_path(&record.image_reference)
        .and_then(|path| std::fs::read(path).ok())
        .and_then(|bytes| ImageFingerprint::from_bytes(&bytes).ok());

    if fingerprint.is_none() {
        tracing::debug!(id = record.id, "corpus record stored without fingerprint");
    }

    IssueRecord {
        id: record.id,
        fingerprint,
        description: record.description,
        latitude: record.latitude,
        longitude: record.longitude,
    }
}
