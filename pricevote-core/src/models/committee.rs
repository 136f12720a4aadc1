//! Hard-voting committee.
//!
//! Each member predicts independently; the committee label for a row is the
//! most frequent member vote. When several classes share the top count, the
//! class voted by the earliest member in committee order wins.

use super::knn::{KNearestNeighbors, KnnConfig};
use super::linear_svc::{LinearSvc, LinearSvcConfig};
use super::random_forest::{ForestConfig, RandomForest};
use super::{check_training_input, require_class_diversity, Classifier, ModelError};
use crate::domain::Label;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hyperparameters of the standard three-member committee.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitteeConfig {
    pub linear_svc: LinearSvcConfig,
    pub knn: KnnConfig,
    pub forest: ForestConfig,
}

impl CommitteeConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        self.linear_svc.validate()?;
        if self.knn.k == 0 {
            return Err(ModelError::InvalidConfig("knn.k must be at least 1".into()));
        }
        if self.forest.n_trees == 0 {
            return Err(ModelError::InvalidConfig(
                "forest.n_trees must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Ordered set of classifiers combined by majority vote.
pub struct Committee {
    members: Vec<Box<dyn Classifier>>,
    fitted: bool,
}

impl std::fmt::Debug for Committee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Committee")
            .field("members", &self.member_names())
            .field("fitted", &self.fitted)
            .finish()
    }
}

impl Committee {
    pub fn new(members: Vec<Box<dyn Classifier>>) -> Result<Self, ModelError> {
        if members.is_empty() {
            return Err(ModelError::EmptyCommittee);
        }
        Ok(Self {
            members,
            fitted: false,
        })
    }

    /// Linear SVC, KNN and random forest, in that order. The order decides
    /// vote ties.
    pub fn standard(config: &CommitteeConfig, forest_seed: u64) -> Result<Self, ModelError> {
        config.validate()?;
        Self::new(vec![
            Box::new(LinearSvc::new(config.linear_svc)),
            Box::new(KNearestNeighbors::new(config.knn)),
            Box::new(RandomForest::new(config.forest, forest_seed)),
        ])
    }

    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Per-member predictions, outer index = member.
    pub fn member_votes(&self, x: &Array2<f64>) -> Result<Vec<Vec<Label>>, ModelError> {
        if !self.fitted {
            return Err(ModelError::NotFitted {
                model: "committee".into(),
            });
        }
        self.members.iter().map(|m| m.predict(x)).collect()
    }

    /// Accuracy of the committee vote on `(x, y)`.
    pub fn score(&self, x: &Array2<f64>, y: &[Label]) -> Result<f64, ModelError> {
        let predicted = self.predict(x)?;
        accuracy(&predicted, y)
    }

    /// Accuracy of each member alone, in committee order.
    pub fn member_scores(
        &self,
        x: &Array2<f64>,
        y: &[Label],
    ) -> Result<Vec<(String, f64)>, ModelError> {
        let votes = self.member_votes(x)?;
        self.members
            .iter()
            .zip(votes)
            .map(|(m, predicted)| Ok((m.name().to_string(), accuracy(&predicted, y)?)))
            .collect()
    }
}

impl Classifier for Committee {
    fn name(&self) -> &str {
        "committee"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[Label]) -> Result<(), ModelError> {
        check_training_input(x, y)?;
        require_class_diversity(y)?;
        self.fitted = false;
        for member in &mut self.members {
            member.fit(x, y)?;
            debug!(member = member.name(), rows = x.nrows(), "member fitted");
        }
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<Label>, ModelError> {
        let votes = self.member_votes(x)?;
        let mut row_votes = Vec::with_capacity(votes.len());
        Ok((0..x.nrows())
            .map(|row| {
                row_votes.clear();
                row_votes.extend(votes.iter().map(|member| member[row]));
                majority_vote(&row_votes)
            })
            .collect())
    }
}

/// Most frequent label in `votes`; ties go to the label voted first.
///
/// An empty slice yields `Hold`.
pub fn majority_vote(votes: &[Label]) -> Label {
    let mut counts = [0usize; 3];
    for v in votes {
        counts[v.index()] += 1;
    }
    let top = counts.iter().copied().max().unwrap_or(0);
    votes
        .iter()
        .copied()
        .find(|v| counts[v.index()] == top)
        .unwrap_or(Label::Hold)
}

/// Fraction of positions where `predicted` equals `truth`.
pub fn accuracy(predicted: &[Label], truth: &[Label]) -> Result<f64, ModelError> {
    if predicted.len() != truth.len() {
        return Err(ModelError::ShapeMismatch(format!(
            "{} predictions but {} labels",
            predicted.len(),
            truth.len()
        )));
    }
    if truth.is_empty() {
        return Err(ModelError::InsufficientData {
            rows: 0,
            required: 1,
        });
    }
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    Ok(correct as f64 / truth.len() as f64)
}
