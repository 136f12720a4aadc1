//! CART decision tree (classification, Gini impurity).
//!
//! Used on its own or as the building block of `RandomForest`. Candidate
//! features per split are drawn at random when `max_features` is set; features
//! that are constant within a node do not count toward that budget.

use super::{argmax_class, check_feature_count, check_training_input, Classifier, ModelError};
use crate::domain::Label;
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Decision tree configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Maximum depth of tree (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Maximum features to consider for split (None = all)
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        proba: [f64; 3],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn n_leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

struct BestSplit {
    gain: f64,
    feature: usize,
    threshold: f64,
}

/// Decision Tree model
#[derive(Debug, Clone)]
pub struct DecisionTree {
    config: TreeConfig,
    seed: u64,
    root: Option<Node>,
    n_features: usize,
}

impl DecisionTree {
    pub fn new(config: TreeConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            root: None,
            n_features: 0,
        }
    }

    /// Grow the tree on the rows listed in `indices` (duplicates allowed, as in
    /// a bootstrap sample).
    pub fn fit_indices(
        &mut self,
        x: &Array2<f64>,
        y: &[Label],
        indices: &[usize],
        rng: &mut StdRng,
    ) -> Result<(), ModelError> {
        check_training_input(x, y)?;
        if indices.is_empty() {
            return Err(ModelError::InsufficientData {
                rows: 0,
                required: 1,
            });
        }
        self.n_features = x.ncols();
        self.root = Some(self.build(x, y, indices.to_vec(), 0, rng));
        Ok(())
    }

    /// Class probabilities of the leaf `row` falls into.
    pub fn predict_proba_row(&self, row: ArrayView1<f64>) -> Option<[f64; 3]> {
        let mut node = self.root.as_ref()?;
        loop {
            match node {
                Node::Leaf { proba } => return Some(*proba),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Number of split levels (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, Node::depth)
    }

    pub fn n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, Node::n_leaves)
    }

    pub(crate) fn n_features(&self) -> usize {
        self.n_features
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &[Label],
        indices: Vec<usize>,
        depth: usize,
        rng: &mut StdRng,
    ) -> Node {
        let counts = class_counts(y, &indices);
        let n = indices.len();

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || n < self.config.min_samples_split || gini(&counts, n) <= 0.0 {
            return leaf(&counts, n);
        }

        let Some(best) = self.find_best_split(x, y, &indices, &counts, rng) else {
            return leaf(&counts, n);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| x[[i, best.feature]] <= best.threshold);
        if left_idx.is_empty() || right_idx.is_empty() {
            return leaf(&counts, n);
        }

        let left = self.build(x, y, left_idx, depth + 1, rng);
        let right = self.build(x, y, right_idx, depth + 1, rng);
        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &[Label],
        indices: &[usize],
        parent_counts: &[usize; 3],
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let n = indices.len();
        let n_features = x.ncols();
        let max_features = self
            .config
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features.max(1));
        let min_leaf = self.config.min_samples_leaf.max(1);
        let parent_impurity = gini(parent_counts, n);

        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);

        let mut visited = 0;
        let mut best: Option<BestSplit> = None;

        for &feature in &features {
            if visited >= max_features && best.is_some() {
                break;
            }

            let mut sorted: Vec<(f64, Label)> =
                indices.iter().map(|&i| (x[[i, feature]], y[i])).collect();
            sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

            if sorted[0].0 == sorted[n - 1].0 {
                continue;
            }
            visited += 1;

            let mut left = [0usize; 3];
            let mut right = *parent_counts;
            for k in 0..n - 1 {
                let class = sorted[k].1.index();
                left[class] += 1;
                right[class] -= 1;

                let (lo, hi) = (sorted[k].0, sorted[k + 1].0);
                if lo == hi {
                    continue;
                }
                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(BestSplit {
                        gain,
                        feature,
                        threshold,
                    });
                }
            }
        }

        best
    }
}

fn class_counts(y: &[Label], indices: &[usize]) -> [usize; 3] {
    let mut counts = [0usize; 3];
    for &i in indices {
        counts[y[i].index()] += 1;
    }
    counts
}

fn gini(counts: &[usize; 3], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn leaf(counts: &[usize; 3], n: usize) -> Node {
    let n = n.max(1) as f64;
    Node::Leaf {
        proba: [
            counts[0] as f64 / n,
            counts[1] as f64 / n,
            counts[2] as f64 / n,
        ],
    }
}

impl Classifier for DecisionTree {
    fn name(&self) -> &str {
        "decision_tree"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[Label]) -> Result<(), ModelError> {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.fit_indices(x, y, &indices, &mut rng)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<Label>, ModelError> {
        if self.root.is_none() {
            return Err(ModelError::NotFitted {
                model: self.name().to_string(),
            });
        }
        check_feature_count(self.name(), self.n_features, x)?;
        Ok(x
            .rows()
            .into_iter()
            .filter_map(|row| self.predict_proba_row(row))
            .map(|proba| argmax_class(&proba))
            .collect())
    }
}
