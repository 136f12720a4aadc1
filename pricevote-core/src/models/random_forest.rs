//! Random Forest implementation
//!
//! Bagged CART trees with per-split feature subsampling. Trees are grown in
//! parallel; each one draws from its own seed derived from the forest seed,
//! so the fitted forest does not depend on thread count. Prediction averages
//! the leaf class probabilities of all trees.

use super::decision_tree::{DecisionTree, TreeConfig};
use super::{argmax_class, check_feature_count, check_training_input, Classifier, ModelError};
use crate::domain::Label;
use crate::rng::child_seed;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Random Forest configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (floor of sqrt of total if None)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
        }
    }
}

/// Random Forest model
#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    seed: u64,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(config: ForestConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            trees: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn max_features(&self, n_features: usize) -> usize {
        self.config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize)
            .max(1)
    }

    /// Mean leaf probabilities across trees for each row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Vec<[f64; 3]> {
        let n_trees = self.trees.len().max(1) as f64;
        x.rows()
            .into_iter()
            .map(|row| {
                let mut sum = [0.0; 3];
                for tree in &self.trees {
                    if let Some(proba) = tree.predict_proba_row(row) {
                        for (s, p) in sum.iter_mut().zip(proba) {
                            *s += p;
                        }
                    }
                }
                sum.map(|s| s / n_trees)
            })
            .collect()
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestConfig::default(), 0)
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[Label]) -> Result<(), ModelError> {
        check_training_input(x, y)?;
        if self.config.n_trees == 0 {
            return Err(ModelError::InvalidConfig(
                "forest.n_trees must be at least 1".into(),
            ));
        }

        let n = x.nrows();
        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: Some(self.max_features(x.ncols())),
        };
        let bootstrap = self.config.bootstrap;
        let seed = self.seed;

        // Build trees in parallel
        let trees: Result<Vec<DecisionTree>, ModelError> = (0..self.config.n_trees)
            .into_par_iter()
            .map(|i| {
                let tree_seed = child_seed(seed, i as u64);
                let mut rng = StdRng::seed_from_u64(tree_seed);
                let indices: Vec<usize> = if bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                let mut tree = DecisionTree::new(tree_config, tree_seed);
                tree.fit_indices(x, y, &indices, &mut rng)?;
                Ok::<_, ModelError>(tree)
            })
            .collect();

        self.trees = trees?;
        debug!(
            trees = self.trees.len(),
            rows = n,
            max_features = ?tree_config.max_features,
            "random_forest fitted"
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<Label>, ModelError> {
        let Some(first) = self.trees.first() else {
            return Err(ModelError::NotFitted {
                model: self.name().to_string(),
            });
        };
        check_feature_count(self.name(), first.n_features(), x)?;
        Ok(self
            .predict_proba(x)
            .iter()
            .map(argmax_class)
            .collect())
    }
}
