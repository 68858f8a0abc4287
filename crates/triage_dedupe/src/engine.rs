use std::sync::{PoisonError, RwLock};

use triage_features::{cosine_similarity, TfIdfVectorizer};

use crate::geo::haversine_m;
use crate::types::{DedupeConfig, DedupeError, DuplicateQuery, DuplicateVerdict, IssueRecord};

// Fixed fusion weights; visual evidence outweighs wording.
const IMAGE_WEIGHT: f64 = 0.6;
const TEXT_WEIGHT: f64 = 0.4;

struct CorpusInner {
    issues: Vec<IssueRecord>,
    vectorizer: TfIdfVectorizer,
}

/// The shared corpus of previously reported issues.
///
/// Append-only: records are added at bulk-load time or one at a time via
/// [`DuplicateCorpus::register_issue`]; nothing is ever evicted. Reads and
/// writes are serialized through an interior reader-writer lock, so every
/// duplicate check sees a consistent snapshot and concurrent registrations
/// cannot tear it. The lexical vectorizer is refitted whenever the
/// description set grows, keeping it fitted over all known descriptions.
pub struct DuplicateCorpus {
    config: DedupeConfig,
    inner: RwLock<CorpusInner>,
}

impl DuplicateCorpus {
    pub fn new(config: DedupeConfig) -> Result<Self, DedupeError> {
        config.validate()?;
        Ok(Self {
            config,
            inner: RwLock::new(CorpusInner {
                issues: Vec::new(),
                vectorizer: TfIdfVectorizer::new(None),
            }),
        })
    }

    pub fn config(&self) -> DedupeConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.read().issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one issue. An absent fingerprint (unhashable source image) is
    /// tolerated and simply contributes 0 image similarity later.
    pub fn register_issue(&self, record: IssueRecord) {
        let mut inner = self.write();
        inner.issues.push(record);
        refit(&mut inner);
        tracing::debug!(corpus_size = inner.issues.len(), "issue registered");
    }

    /// Bulk-append records, fitting the vectorizer once at the end.
    pub fn load_records(&self, records: Vec<IssueRecord>) {
        let mut inner = self.write();
        inner.issues.extend(records);
        refit(&mut inner);
        tracing::info!(corpus_size = inner.issues.len(), "duplicate corpus loaded");
    }

    /// Decide whether `query` duplicates a known issue.
    ///
    /// Distance gating runs before any similarity computation: two visually
    /// identical images reported from different cities must never match. For
    /// gated candidates the combined score is `0.6 × image + 0.4 × text`,
    /// the single best candidate wins (ties keep the first encountered), and
    /// the verdict is positive iff the best score reaches the threshold.
    pub fn check(&self, query: &DuplicateQuery<'_>) -> DuplicateVerdict {
        let inner = self.read();
        if inner.issues.is_empty() {
            return DuplicateVerdict::not_duplicate();
        }

        let query_text = inner.vectorizer.transform(query.description);

        let mut best_similarity = 0.0f64;
        let mut best_match: Option<u64> = None;

        for issue in &inner.issues {
            let distance = haversine_m(
                query.latitude,
                query.longitude,
                issue.latitude,
                issue.longitude,
            );
            if distance > self.config.radius_m {
                continue;
            }

            let image_similarity = match (query.fingerprint, issue.fingerprint) {
                (Some(a), Some(b)) => a.similarity(b),
                _ => 0.0,
            };

            let text_similarity = if inner.vectorizer.is_fitted() {
                let issue_text = inner.vectorizer.transform(&issue.description);
                cosine_similarity(&query_text.values, &issue_text.values)
            } else {
                0.0
            };

            let combined = IMAGE_WEIGHT * image_similarity + TEXT_WEIGHT * text_similarity;
            if combined > best_similarity {
                best_similarity = combined;
                best_match = Some(issue.id);
            }
        }

        let verdict = DuplicateVerdict {
            is_duplicate: best_similarity >= self.config.similarity_threshold,
            matched_id: best_match,
            similarity: best_similarity,
        };
        tracing::debug!(
            is_duplicate = verdict.is_duplicate,
            matched_id = ?verdict.matched_id,
            similarity = verdict.similarity,
            "duplicate check complete"
        );
        verdict
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CorpusInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CorpusInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn refit(inner: &mut CorpusInner) {
    let descriptions: Vec<&str> = inner
        .issues
        .iter()
        .map(|issue| issue.description.as_str())
        .collect();
    if !descriptions.is_empty() {
        inner.vectorizer.fit(&descriptions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use triage_features::ImageFingerprint;

    fn fingerprint(seed: u8) -> ImageFingerprint {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            Rgb([
                ((x * seed as u32) % 256) as u8,
                ((y + seed as u32 * 7) % 256) as u8,
                ((x + y) % 256) as u8,
            ])
        }));
        ImageFingerprint::of_image(&img)
    }

    fn record(id: u64, seed: u8, description: &str, lat: f64, lon: f64) -> IssueRecord {
        IssueRecord {
            id,
            fingerprint: Some(fingerprint(seed)),
            description: description.to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    fn corpus() -> DuplicateCorpus {
        DuplicateCorpus::new(DedupeConfig::default()).expect("valid config")
    }

    #[test]
    fn empty_corpus_never_matches() {
        let corpus = corpus();
        let verdict = corpus.check(&DuplicateQuery {
            fingerprint: Some(fingerprint(3)),
            description: "water leaking everywhere",
            latitude: 28.6139,
            longitude: 77.2090,
        });
        assert_eq!(verdict, DuplicateVerdict::not_duplicate());
    }

    #[test]
    fn identical_submission_within_radius_is_duplicate() {
        let corpus = corpus();
        corpus.load_records(vec![
            record(7, 3, "sewage overflowing near the market", 28.6139, 77.2090),
            record(8, 9, "street light out on elm road", 28.6150, 77.2101),
        ]);

        let verdict = corpus.check(&DuplicateQuery {
            fingerprint: Some(fingerprint(3)),
            description: "sewage overflowing near the market",
            latitude: 28.6139,
            longitude: 77.2090,
        });

        assert!(verdict.is_duplicate);
        assert_eq!(verdict.matched_id, Some(7));
        assert!(verdict.similarity >= 0.99, "got {}", verdict.similarity);
    }

    #[test]
    fn distance_gate_beats_identical_content() {
        let corpus = corpus();
        // Same image, same wording, different city.
        corpus.load_records(vec![record(
            1,
            5,
            "huge pothole outside the bakery",
            28.6139,
            77.2090,
        )]);

        let verdict = corpus.check(&DuplicateQuery {
            fingerprint: Some(fingerprint(5)),
            description: "huge pothole outside the bakery",
            latitude: 19.0760,
            longitude: 72.8777,
        });

        assert!(!verdict.is_duplicate);
        assert_eq!(verdict.matched_id, None);
        assert_eq!(verdict.similarity, 0.0);
    }

    #[test]
    fn just_beyond_radius_is_excluded() {
        let corpus = corpus();
        corpus.load_records(vec![record(
            2,
            5,
            "huge pothole outside the bakery",
            28.6139,
            77.2090,
        )]);

        // ~167 m north of the stored issue with the default 100 m radius.
        let verdict = corpus.check(&DuplicateQuery {
            fingerprint: Some(fingerprint(5)),
            description: "huge pothole outside the bakery",
            latitude: 28.6154,
            longitude: 77.2090,
        });
        assert!(!verdict.is_duplicate);
        assert_eq!(verdict.matched_id, None);
    }

    #[test]
    fn unhashable_image_contributes_zero_image_similarity() {
        let corpus = corpus();
        corpus.load_records(vec![record(
            3,
            5,
            "garbage heap behind the school",
            28.6139,
            77.2090,
        )]);

        let verdict = corpus.check(&DuplicateQuery {
            fingerprint: None,
            description: "garbage heap behind the school",
            latitude: 28.6139,
            longitude: 77.2090,
        });

        // Text similarity alone caps the combined score at 0.4.
        assert!(!verdict.is_duplicate);
        assert_eq!(verdict.matched_id, Some(3));
        assert!(verdict.similarity <= 0.4 + 1e-9);
        assert!(verdict.similarity > 0.3);
    }

    #[test]
    fn best_candidate_reported_below_threshold() {
        let corpus = corpus();
        corpus.load_records(vec![
            record(10, 3, "water pooling by the bus stop", 28.6139, 77.2090),
            record(11, 60, "cracked pavement slabs", 28.6140, 77.2091),
        ]);

        let verdict = corpus.check(&DuplicateQuery {
            fingerprint: Some(fingerprint(3)),
            description: "something unrelated entirely",
            latitude: 28.6139,
            longitude: 77.2090,
        });

        assert!(verdict.similarity > 0.0);
        assert_eq!(verdict.matched_id, Some(10));
    }

    #[test]
    fn single_append_refits_vectorizer() {
        let corpus = corpus();
        corpus.register_issue(record(
            20,
            4,
            "overflowing dustbin at the park gate",
            28.6139,
            77.2090,
        ));
        assert_eq!(corpus.len(), 1);

        let verdict = corpus.check(&DuplicateQuery {
            fingerprint: None,
            description: "overflowing dustbin at the park gate",
            latitude: 28.6139,
            longitude: 77.2090,
        });
        // Vectorizer must be fitted after a single append: text term is 0.4.
        assert!((verdict.similarity - 0.4).abs() < 1e-9);
    }

    #[test]
    fn concurrent_registration_and_checks_keep_consistent_counts() {
        use std::sync::Arc;

        let corpus = Arc::new(corpus());
        let mut handles = Vec::new();

        for writer in 0..4u64 {
            let corpus = Arc::clone(&corpus);
            handles.push(std::thread::spawn(move || {
                for i in 0..25u64 {
                    corpus.register_issue(IssueRecord {
                        id: writer * 100 + i,
                        fingerprint: None,
                        description: format!("report {writer}-{i}"),
                        latitude: 28.6139,
                        longitude: 77.2090,
                    });
                }
            }));
        }
        for _ in 0..2 {
            let corpus = Arc::clone(&corpus);
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    let _ = corpus.check(&DuplicateQuery {
                        fingerprint: None,
                        description: "report probe",
                        latitude: 28.6139,
                        longitude: 77.2090,
                    });
                }
            }));
        }

        for handle in handles {
            handle.join().expect("thread");
        }
        assert_eq!(corpus.len(), 100);
    }
}
