use serde::{Deserialize, Serialize};

use crate::taxonomy::Category;

/// Dense integer alphabet over the categories seen at training time.
///
/// Classes are sorted by label string so the encoding is independent of
/// sample order; the class index doubles as the forest's target value and as
/// the column index in vote tallies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<Category>,
}

impl LabelEncoder {
    /// Derive the alphabet from training labels.
    pub fn fit(labels: &[Category]) -> Self {
        let mut classes: Vec<Category> = Vec::new();
        for &label in labels {
            if !classes.contains(&label) {
                classes.push(label);
            }
        }
        classes.sort_by_key(|c| c.label());
        Self { classes }
    }

    pub fn encode(&self, category: Category) -> Option<usize> {
        self.classes.iter().position(|&c| c == category)
    }

    pub fn decode(&self, index: usize) -> Option<Category> {
        self.classes.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[Category] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_sorted_by_label_and_stable() {
        let a = LabelEncoder::fit(&[
            Category::SewerOverflow,
            Category::Garbage,
            Category::RoadDamage,
        ]);
        let b = LabelEncoder::fit(&[
            Category::RoadDamage,
            Category::SewerOverflow,
            Category::Garbage,
            Category::Garbage,
        ]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        // "Garbage Issue" < "Road Damage / Pothole" < "Sewer Overflow"
        assert_eq!(a.decode(0), Some(Category::Garbage));
        assert_eq!(a.decode(1), Some(Category::RoadDamage));
        assert_eq!(a.decode(2), Some(Category::SewerOverflow));
    }

    #[test]
    fn encode_decode_roundtrip() {
        let encoder = LabelEncoder::fit(&Category::KNOWN);
        for category in Category::KNOWN {
            let index = encoder.encode(category).expect("known class");
            assert_eq!(encoder.decode(index), Some(category));
        }
        assert_eq!(encoder.encode(Category::Other), None);
    }
}
