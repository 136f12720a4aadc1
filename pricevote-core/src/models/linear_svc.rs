//! Linear support vector classifier.
//!
//! One-vs-rest over the classes seen in training. Each binary problem
//! minimizes the L2-regularized squared hinge loss
//!
//! ```text
//! 0.5 * (|w|^2 + b^2) + C * sum_i max(0, 1 - s_i * (w . x_i + b))^2
//! ```
//!
//! The intercept is penalized like one more weight on a constant feature.
//! by full-batch gradient descent with a fixed step bounded by the loss's
//! smoothness constant, so training is deterministic and needs no RNG.

use super::{
    argmax_class, check_feature_count, check_training_input, require_class_diversity,
    Classifier, ModelError,
};
use crate::domain::Label;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Linear SVC hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearSvcConfig {
    /// Inverse regularization strength.
    pub c: f64,
    /// Maximum gradient steps per binary problem.
    pub max_iter: usize,
    /// Stop once the gradient norm falls below this.
    pub tol: f64,
}

impl Default for LinearSvcConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

impl LinearSvcConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(ModelError::InvalidConfig(format!(
                "linear_svc.c must be positive, got {}",
                self.c
            )));
        }
        if self.max_iter == 0 {
            return Err(ModelError::InvalidConfig(
                "linear_svc.max_iter must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Separating hyperplane for one class against the rest.
#[derive(Debug, Clone)]
struct Hyperplane {
    label: Label,
    weights: Array1<f64>,
    bias: f64,
}

impl Hyperplane {
    fn decision(&self, row: ArrayView1<f64>) -> f64 {
        self.weights.dot(&row) + self.bias
    }
}

/// Linear-margin committee member.
#[derive(Debug, Clone)]
pub struct LinearSvc {
    config: LinearSvcConfig,
    planes: Vec<Hyperplane>,
    n_features: usize,
}

impl LinearSvc {
    pub fn new(config: LinearSvcConfig) -> Self {
        Self {
            config,
            planes: Vec::new(),
            n_features: 0,
        }
    }

    /// Raw decision values for one row, `-inf` for classes unseen in training.
    pub fn decision_function(&self, row: ArrayView1<f64>) -> [f64; 3] {
        let mut scores = [f64::NEG_INFINITY; 3];
        for plane in &self.planes {
            scores[plane.label.index()] = plane.decision(row);
        }
        scores
    }

    fn fit_binary(&self, x: &Array2<f64>, signs: &Array1<f64>) -> (Array1<f64>, f64) {
        let n_features = x.ncols();
        let c = self.config.c;

        // Gradient of the loss is L-Lipschitz with L <= 1 + 2C * sum(|x_i|^2 + 1)
        let smoothness: f64 = 1.0
            + 2.0 * c * x.rows().into_iter().map(|r| r.dot(&r) + 1.0).sum::<f64>();
        let step = 1.0 / smoothness;

        let mut w = Array1::<f64>::zeros(n_features);
        let mut b = 0.0;

        for _ in 0..self.config.max_iter {
            let mut grad_w = w.clone();
            let mut grad_b = b;
            for (row, &s) in x.rows().into_iter().zip(signs.iter()) {
                let margin = s * (w.dot(&row) + b);
                if margin < 1.0 {
                    let coef = -2.0 * c * (1.0 - margin) * s;
                    grad_w.scaled_add(coef, &row);
                    grad_b += coef;
                }
            }

            let norm = (grad_w.dot(&grad_w) + grad_b * grad_b).sqrt();
            if norm < self.config.tol {
                break;
            }
            w.scaled_add(-step, &grad_w);
            b -= step * grad_b;
        }
        (w, b)
    }
}

impl Default for LinearSvc {
    fn default() -> Self {
        Self::new(LinearSvcConfig::default())
    }
}

impl Classifier for LinearSvc {
    fn name(&self) -> &str {
        "linear_svc"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[Label]) -> Result<(), ModelError> {
        check_training_input(x, y)?;
        require_class_diversity(y)?;
        self.config.validate()?;

        let present: Vec<Label> = Label::ALL
            .into_iter()
            .filter(|l| y.contains(l))
            .collect();

        let mut planes = Vec::with_capacity(present.len());
        for label in present {
            let signs: Array1<f64> = y
                .iter()
                .map(|&t| if t == label { 1.0 } else { -1.0 })
                .collect();
            let (weights, bias) = self.fit_binary(x, &signs);
            planes.push(Hyperplane {
                label,
                weights,
                bias,
            });
        }

        debug!(classes = planes.len(), rows = x.nrows(), "linear_svc fitted");
        self.planes = planes;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<Label>, ModelError> {
        if self.planes.is_empty() {
            return Err(ModelError::NotFitted {
                model: self.name().to_string(),
            });
        }
        check_feature_count(self.name(), self.n_features, x)?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| argmax_class(&self.decision_function(row)))
            .collect())
    }
}
