use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{FeatureVector, SignalOrigin};

/// English stopwords removed before vectorization. Descriptions of civic
/// issues are short and formulaic, so function words carry no signal.
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during", "each",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Lowercase alphanumeric tokens of length >= 2, stopwords removed.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !STOPWORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Term-frequency / inverse-document-frequency vectorizer over a fixed,
/// corpus-derived vocabulary.
///
/// Fitted once over a training corpus; read-only afterwards. `transform`
/// before `fit` degrades to an all-zero vector of the configured dimension
/// tagged [`SignalOrigin::UnfittedFallback`] instead of erroring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    /// Term → column index, indices assigned in alphabetical term order.
    vocabulary: HashMap<String, usize>,
    /// Smoothed inverse document frequency per vocabulary column.
    idf: Vec<f32>,
    /// Number of documents seen during fitting.
    n_documents: usize,
    /// Optional vocabulary cap; the most frequent terms win.
    max_features: Option<usize>,
}

impl TfIdfVectorizer {
    pub fn new(max_features: Option<usize>) -> Self {
        Self {
            max_features,
            ..Self::default()
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Output dimension: the fitted vocabulary size, or the configured cap
    /// (0 if uncapped) before fitting.
    pub fn dimension(&self) -> usize {
        if self.is_fitted() {
            self.vocabulary.len()
        } else {
            self.max_features.unwrap_or(0)
        }
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// Fit the vocabulary and IDF weights on a document corpus.
    ///
    /// When a vocabulary cap is configured, terms are ranked by total corpus
    /// frequency (ties broken alphabetically) and the top terms are kept.
    /// Column indices are then assigned in alphabetical order so the mapping
    /// is stable across refits on the same corpus.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) {
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut corpus_frequency: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = tokenize(doc.as_ref());
            for token in &tokens {
                *corpus_frequency.entry(token.clone()).or_insert(0) += 1;
            }
            let unique: HashSet<&String> = tokens.iter().collect();
            for token in unique {
                *document_frequency.entry(token.clone()).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<String> = corpus_frequency.keys().cloned().collect();
        if let Some(cap) = self.max_features {
            terms.sort_by(|a, b| {
                corpus_frequency[b]
                    .cmp(&corpus_frequency[a])
                    .then_with(|| a.cmp(b))
            });
            terms.truncate(cap);
        }
        terms.sort();

        let n = documents.len();
        let mut vocabulary = HashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (index, term) in terms.into_iter().enumerate() {
            let df = document_frequency.get(&term).copied().unwrap_or(0);
            idf.push((((n as f32) + 1.0) / ((df as f32) + 1.0)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        self.vocabulary = vocabulary;
        self.idf = idf;
        self.n_documents = n;
    }

    /// Project a document into the fitted vocabulary space.
    ///
    /// Term counts are weighted by IDF and L2-normalized, so the dot product
    /// of two transformed vectors is their cosine similarity.
    pub fn transform(&self, document: &str) -> FeatureVector {
        if !self.is_fitted() {
            return FeatureVector::zeroed(self.dimension(), SignalOrigin::UnfittedFallback);
        }

        let mut values = vec![0.0f32; self.vocabulary.len()];
        for token in tokenize(document) {
            if let Some(&index) = self.vocabulary.get(&token) {
                values[index] += 1.0;
            }
        }

        for (index, value) in values.iter_mut().enumerate() {
            *value *= self.idf[index];
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut values {
                *value /= norm;
            }
        }

        FeatureVector::observed(values)
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 on length mismatch, empty input, or zero magnitude; a missing
/// lexical signal is "no similarity", not an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
