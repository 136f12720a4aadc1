//! K-Nearest Neighbors classifier
//!
//! Euclidean distance, uniform weights. Neighbors at equal distance are taken
//! in training order; a tied vote goes to the lowest class.

use super::{argmax_class, check_feature_count, check_training_input, Classifier, ModelError};
use crate::domain::Label;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// KNN hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnConfig {
    /// Number of neighbors consulted per prediction.
    pub k: usize,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self { k: 5 }
    }
}

/// Distance-based committee member.
#[derive(Debug, Clone)]
pub struct KNearestNeighbors {
    config: KnnConfig,
    x_train: Option<Array2<f64>>,
    y_train: Vec<Label>,
}

impl KNearestNeighbors {
    pub fn new(config: KnnConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: Vec::new(),
        }
    }

    fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    fn predict_one(&self, x_train: &Array2<f64>, sample: ArrayView1<f64>) -> Label {
        let mut distances: Vec<(usize, f64)> = x_train
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, train)| (i, Self::euclidean(sample, train)))
            .collect();

        // Stable sort keeps training order among equal distances
        distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut votes = [0.0; 3];
        for (idx, _) in distances.iter().take(self.config.k) {
            votes[self.y_train[*idx].index()] += 1.0;
        }
        argmax_class(&votes)
    }
}

impl Default for KNearestNeighbors {
    fn default() -> Self {
        Self::new(KnnConfig::default())
    }
}

impl Classifier for KNearestNeighbors {
    fn name(&self) -> &str {
        "knn"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[Label]) -> Result<(), ModelError> {
        check_training_input(x, y)?;
        if self.config.k == 0 {
            return Err(ModelError::InvalidConfig("knn.k must be at least 1".into()));
        }
        if x.nrows() < self.config.k {
            return Err(ModelError::InsufficientData {
                rows: x.nrows(),
                required: self.config.k,
            });
        }
        self.x_train = Some(x.clone());
        self.y_train = y.to_vec();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<Label>, ModelError> {
        let x_train = self.x_train.as_ref().ok_or_else(|| ModelError::NotFitted {
            model: self.name().to_string(),
        })?;
        check_feature_count(self.name(), x_train.ncols(), x)?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| self.predict_one(x_train, row))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn nearest_cluster_wins() {
        let x = array![[0.0, 0.0], [0.1, 0.0], [0.0, 0.1], [5.0, 5.0], [5.1, 5.0], [5.0, 5.1]];
        let y = vec![
            Label::Sell,
            Label::Sell,
            Label::Sell,
            Label::Buy,
            Label::Buy,
            Label::Buy,
        ];
        let mut knn = KNearestNeighbors::new(KnnConfig { k: 3 });
        knn.fit(&x, &y).unwrap();
        assert_eq!(
            knn.predict(&array![[0.05, 0.05], [4.9, 4.9]]).unwrap(),
            vec![Label::Sell, Label::Buy]
        );
    }

    #[test]
    fn tied_vote_goes_to_lowest_class() {
        let x = array![[-1.0], [1.0]];
        let y = vec![Label::Buy, Label::Sell];
        let mut knn = KNearestNeighbors::new(KnnConfig { k: 2 });
        knn.fit(&x, &y).unwrap();
        assert_eq!(knn.predict(&array![[0.0]]).unwrap(), vec![Label::Sell]);
    }

    #[test]
    fn fewer_rows_than_k_is_insufficient() {
        let mut knn = KNearestNeighbors::default();
        let err = knn
            .fit(&array![[0.0], [1.0]], &[Label::Buy, Label::Sell])
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::InsufficientData {
                rows: 2,
                required: 5
            }
        );
    }

    #[test]
    fn predict_before_fit_fails() {
        let err = KNearestNeighbors::default().predict(&array![[0.0]]).unwrap_err();
        assert!(matches!(err, ModelError::NotFitted { .. }));
    }
}
