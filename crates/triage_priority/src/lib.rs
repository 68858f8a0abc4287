//! triage_priority: maps a triaged issue to a four-level priority.
//!
//! The policy is a small additive score: the category's base severity, plus
//! one for a sensitive-location mention in the description, plus one for a
//! duplicate report, mapped through fixed breakpoints. Simple and auditable
//! on purpose; the table and breakpoints are behavioral contract.

use serde::{Deserialize, Serialize};
use triage_classify::Category;

/// Totally ordered priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityLevel {
    /// Fixed score breakpoints: ≥5 Critical, ≥4 High, ≥3 Medium, else Low.
    /// Scores are not clamped; the table caps the effective range on its own.
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 5 => PriorityLevel::Critical,
            4 => PriorityLevel::High,
            3 => PriorityLevel::Medium,
            _ => PriorityLevel::Low,
        }
    }
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PriorityLevel::Low => "Low",
            PriorityLevel::Medium => "Medium",
            PriorityLevel::High => "High",
            PriorityLevel::Critical => "Critical",
        };
        f.write_str(label)
    }
}

/// Keywords that mark a report as near a vulnerable population. A coarse
/// textual proxy, not a geocoding lookup.
pub const SENSITIVE_KEYWORDS: &[&str] = &[
    "hospital",
    "school",
    "clinic",
    "medical",
    "emergency",
    "college",
    "university",
    "kindergarten",
    "church",
    "temple",
    "mosque",
    "playground",
    "park",
    "elderly",
    "nursing home",
];

/// Stateless priority scorer over the severity table and keyword list.
#[derive(Debug, Clone)]
pub struct PriorityScorer {
    keywords: &'static [&'static str],
}

impl Default for PriorityScorer {
    fn default() -> Self {
        Self {
            keywords: SENSITIVE_KEYWORDS,
        }
    }
}

impl PriorityScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring scan of the description for sensitive
    /// location mentions.
    pub fn is_sensitive(&self, description: &str) -> bool {
        let lowered = description.to_lowercase();
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }

    /// The raw additive score before breakpoint mapping.
    pub fn score(&self, category: Category, sensitive: bool, duplicate: bool) -> u8 {
        category.severity() + u8::from(sensitive) + u8::from(duplicate)
    }

    /// Assign a priority level to a triaged issue.
    pub fn assign(
        &self,
        category: Category,
        description: &str,
        is_duplicate: bool,
    ) -> PriorityLevel {
        let sensitive = self.is_sensitive(description);
        let score = self.score(category, sensitive, is_duplicate);
        let level = PriorityLevel::from_score(score);
        tracing::debug!(
            category = %category,
            sensitive,
            is_duplicate,
            score,
            priority = %level,
            "priority assigned"
        );
        level
    }

    /// Human-readable justification for a priority assignment.
    ///
    /// A pure companion view of [`PriorityScorer::assign`]: it re-derives the
    /// same severity and signals, so the two can never disagree.
    pub fn explain(&self, category: Category, sensitive: bool, duplicate: bool) -> String {
        let mut reasons = Vec::new();

        let severity = category.severity();
        if severity >= 4 {
            reasons.push(format!("{category} is high severity"));
        } else if severity >= 3 {
            reasons.push(format!("{category} is moderate severity"));
        }

        if sensitive {
            reasons.push("Located near sensitive area (hospital/school)".to_string());
        }
        if duplicate {
            reasons.push("Duplicate report increases urgency".to_string());
        }

        if reasons.is_empty() {
            "Standard priority".to_string()
        } else {
            reasons.join(", ")
        }
    }

    /// How many times issues were reported from the same location.
    ///
    /// Always 0 for now: repeat-report counting has no agreed product policy
    /// yet, and inventing one here would silently change priorities. The
    /// signature stays so the scorer can absorb the count once defined.
    pub fn repeat_factor(&self, _latitude: f64, _longitude: f64) -> u32 {
        0
    }
}
