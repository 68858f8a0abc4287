use serde::{Deserialize, Serialize};

/// The closed civic issue taxonomy.
///
/// Five known categories plus the reserved [`Category::Other`], which doubles
/// as the low-confidence fallback label and the target for unknown label
/// strings. Severity lookup is total: every variant has a severity, so no
/// caller ever needs a default-on-miss path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Garbage Issue")]
    Garbage,
    #[serde(rename = "Road Damage / Pothole")]
    RoadDamage,
    #[serde(rename = "Street Light Failure")]
    StreetLight,
    #[serde(rename = "Water Leakage")]
    WaterLeakage,
    #[serde(rename = "Sewer Overflow")]
    SewerOverflow,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    /// The trainable taxonomy, in canonical order. `Other` is excluded: it is
    /// never a classifier output.
    pub const KNOWN: [Category; 5] = [
        Category::Garbage,
        Category::RoadDamage,
        Category::StreetLight,
        Category::WaterLeakage,
        Category::SewerOverflow,
    ];

    /// Base severity used by priority scoring. Total over all variants;
    /// `Other` carries the default severity 2.
    pub fn severity(self) -> u8 {
        match self {
            Category::SewerOverflow => 4,
            Category::WaterLeakage => 3,
            Category::RoadDamage => 3,
            Category::Garbage => 2,
            Category::StreetLight => 2,
            Category::Other => 2,
        }
    }

    /// The wire label for this category.
    pub fn label(self) -> &'static str {
        match self {
            Category::Garbage => "Garbage Issue",
            Category::RoadDamage => "Road Damage / Pothole",
            Category::StreetLight => "Street Light Failure",
            Category::WaterLeakage => "Water Leakage",
            Category::SewerOverflow => "Sewer Overflow",
            Category::Other => "Other",
        }
    }

    /// Map a label string onto the taxonomy. Unknown strings land on
    /// [`Category::Other`] so downstream severity lookup stays total.
    pub fn from_label(label: &str) -> Category {
        Category::KNOWN
            .into_iter()
            .find(|c| c.label() == label)
            .unwrap_or(Category::Other)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
