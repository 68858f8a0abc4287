use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifyError;

/// Training hyperparameters for the tree ensemble.
///
/// The seed makes training fully deterministic: identical samples and config
/// always produce an identical forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of bootstrap trees.
    pub n_trees: usize,
    /// Optional depth cap; `None` grows trees until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs before a split is attempted.
    pub min_samples_split: usize,
    /// RNG seed for bootstrap sampling and feature subsampling.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        class: u16,
    },
    Split {
        feature: u16,
        threshold: f32,
        left: u32,
        right: u32,
    },
}

/// One CART tree stored as a flat node arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn predict(&self, features: &[f32]) -> u16 {
        let mut index = 0usize;
        loop {
            match &self.nodes[index] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature as usize] <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
    }
}

/// A bagged ensemble of Gini-split decision trees.
///
/// Chosen over anything scale-sensitive on purpose: the fused feature vector
/// mixes L1-normalized histogram mass, 0–255 channel means, and L2-normalized
/// TF-IDF weights, and trees split on raw thresholds without caring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    n_features: usize,
}

impl RandomForest {
    /// Fit the forest on row-major samples `x` with encoded labels `y`.
    pub fn fit(
        x: &[Vec<f32>],
        y: &[usize],
        n_classes: usize,
        cfg: &ForestConfig,
    ) -> Result<Self, ClassifyError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(ClassifyError::EmptyDataset);
        }
        let n_features = x[0].len();
        if x.iter().any(|row| row.len() != n_features) {
            return Err(ClassifyError::DimensionMismatch {
                expected: n_features,
                actual: x
                    .iter()
                    .map(Vec::len)
                    .find(|&len| len != n_features)
                    .unwrap_or(0),
            });
        }

        let mut rng = StdRng::seed_from_u64(cfg.seed);
        // sqrt(n_features) candidate features per split, the usual bagging
        // heuristic for classification.
        let features_per_split = ((n_features as f64).sqrt().round() as usize).max(1);

        let trees = (0..cfg.n_trees)
            .map(|_| {
                let sample: Vec<usize> = (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect();
                grow_tree(x, y, sample, n_classes, features_per_split, cfg, &mut rng)
            })
            .collect();

        Ok(Self {
            trees,
            n_classes,
            n_features,
        })
    }

    /// Per-class vote shares for one feature vector. Sums to 1.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f64> {
        let mut votes = vec![0u32; self.n_classes];
        for tree in &self.trees {
            let class = tree.predict(features) as usize;
            if class < votes.len() {
                votes[class] += 1;
            }
        }
        let total = self.trees.len().max(1) as f64;
        votes.into_iter().map(|v| v as f64 / total).collect()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

fn grow_tree(
    x: &[Vec<f32>],
    y: &[usize],
    sample: Vec<usize>,
    n_classes: usize,
    features_per_split: usize,
    cfg: &ForestConfig,
    rng: &mut StdRng,
) -> DecisionTree {
    let mut nodes = Vec::new();
    build_node(
        x,
        y,
        sample,
        n_classes,
        features_per_split,
        cfg,
        rng,
        0,
        &mut nodes,
    );
    DecisionTree { nodes }
}

/// Recursively build a subtree, returning its root index in `nodes`.
#[allow(clippy::too_many_arguments)]
fn build_node(
    x: &[Vec<f32>],
    y: &[usize],
    sample: Vec<usize>,
    n_classes: usize,
    features_per_split: usize,
    cfg: &ForestConfig,
    rng: &mut StdRng,
    depth: usize,
    nodes: &mut Vec<Node>,
) -> u32 {
    let counts = class_counts(y, &sample, n_classes);
    let majority = majority_class(&counts);

    let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
    let too_small = sample.len() < cfg.min_samples_split;
    let too_deep = cfg.max_depth.is_some_and(|d| depth >= d);

    if pure || too_small || too_deep {
        nodes.push(Node::Leaf { class: majority });
        return (nodes.len() - 1) as u32;
    }

    let split = best_split(x, y, &sample, n_classes, features_per_split, rng);
    let Some((feature, threshold)) = split else {
        // No candidate feature separated the sample; nothing left to learn.
        nodes.push(Node::Leaf { class: majority });
        return (nodes.len() - 1) as u32;
    };

    let (left_sample, right_sample): (Vec<usize>, Vec<usize>) = sample
        .into_iter()
        .partition(|&i| x[i][feature] <= threshold);

    // Reserve the split slot before the children so child indices are known.
    let index = nodes.len();
    nodes.push(Node::Leaf { class: majority });

    let left = build_node(
        x,
        y,
        left_sample,
        n_classes,
        features_per_split,
        cfg,
        rng,
        depth + 1,
        nodes,
    );
    let right = build_node(
        x,
        y,
        right_sample,
        n_classes,
        features_per_split,
        cfg,
        rng,
        depth + 1,
        nodes,
    );

    nodes[index] = Node::Split {
        feature: feature as u16,
        threshold,
        left,
        right,
    };
    index as u32
}

fn class_counts(y: &[usize], sample: &[usize], n_classes: usize) -> Vec<u32> {
    let mut counts = vec![0u32; n_classes];
    for &i in sample {
        counts[y[i]] += 1;
    }
    counts
}

fn majority_class(counts: &[u32]) -> u16 {
    counts
        .iter()
        .enumerate()
        .max_by_key(|&(_, &count)| count)
        .map(|(class, _)| class as u16)
        .unwrap_or(0)
}

fn gini(counts: &[u32], total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Pick `k` distinct feature indices without replacement.
fn sample_features(n_features: usize, k: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n_features).collect();
    let k = k.min(n_features);
    for i in 0..k {
        let j = rng.gen_range(i..n_features);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

/// Exhaustive Gini search over midpoint thresholds of a random feature subset.
fn best_split(
    x: &[Vec<f32>],
    y: &[usize],
    sample: &[usize],
    n_classes: usize,
    features_per_split: usize,
    rng: &mut StdRng,
) -> Option<(usize, f32)> {
    let n_features = x[0].len();
    let parent_counts = class_counts(y, sample, n_classes);
    let total = sample.len() as f64;
    let parent_gini = gini(&parent_counts, total);

    let mut best: Option<(usize, f32)> = None;
    let mut best_impurity = parent_gini;

    for feature in sample_features(n_features, features_per_split, rng) {
        let mut ordered: Vec<(f32, usize)> =
            sample.iter().map(|&i| (x[i][feature], y[i])).collect();
        ordered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_counts = vec![0u32; n_classes];
        let mut right_counts = parent_counts.clone();

        for window in 0..ordered.len() - 1 {
            let (value, class) = ordered[window];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let next_value = ordered[window + 1].0;
            if next_value <= value {
                continue;
            }

            let left_total = (window + 1) as f64;
            let right_total = total - left_total;
            let impurity = (left_total / total) * gini(&left_counts, left_total)
                + (right_total / total) * gini(&right_counts, right_total);

            if impurity < best_impurity {
                best_impurity = impurity;
                best = Some((feature, (value + next_value) / 2.0));
            }
        }
    }

    best
}
