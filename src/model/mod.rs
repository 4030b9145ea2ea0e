//! Classifiers, training/model selection and the persisted artifact.

mod artifact;
mod forest;
mod linear;
mod metrics;
mod trainer;
mod tree;

pub use artifact::{ArtifactHandle, ArtifactMetadata, ModelArtifact};
pub use forest::RandomForest;
pub use linear::LogisticModel;
pub use metrics::{ClassMetrics, Evaluation};
pub use trainer::{train_and_publish, Trainer, TrainingOutcome};
pub use tree::{DecisionTree, TreeParams};

#[cfg(test)]
pub(crate) use artifact::humidity_fixture;

use crate::data::Label;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Probabilistic multi-class classifier over [`Label::ALL`].
pub trait Classifier {
    /// One probability per label, indexed by [`Label::index`]; sums to 1.
    fn predict_proba(&self, features: &[f64]) -> Vec<f64>;

    fn predict(&self, features: &[f64]) -> Prediction {
        Prediction::from_probabilities(self.predict_proba(features))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    /// Probability of `label`
    pub confidence: f64,
    pub probabilities: Vec<f64>,
}

impl Prediction {
    /// Arg-max; an exact tie resolves to the more severe label. NaN orders
    /// above every number, so a broken vector never lands on `Low`.
    pub fn from_probabilities(probabilities: Vec<f64>) -> Self {
        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate() {
            if p.total_cmp(&probabilities[best]).is_ge() {
                best = i;
            }
        }
        Self {
            label: Label::from_index(best).unwrap_or(Label::Critical),
            confidence: probabilities.get(best).copied().unwrap_or(0.0),
            probabilities,
        }
    }

    /// Every probability is a finite number and there is one per label.
    pub fn is_well_formed(&self) -> bool {
        self.probabilities.len() == Label::ALL.len()
            && self.probabilities.iter().all(|p| p.is_finite())
    }

    /// Probability-weighted severity in [0, 1].
    pub fn severity_index(&self) -> f64 {
        let top = (Label::ALL.len() - 1) as f64;
        self.probabilities
            .iter()
            .enumerate()
            .map(|(i, p)| p * i as f64 / top)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Logistic,
    DecisionTree,
    RandomForest,
}

impl Algorithm {
    /// Lower is simpler; breaks accuracy ties during selection.
    pub fn complexity(self) -> u8 {
        match self {
            Algorithm::Logistic => 0,
            Algorithm::DecisionTree => 1,
            Algorithm::RandomForest => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Logistic => "logistic",
            Algorithm::DecisionTree => "decision_tree",
            Algorithm::RandomForest => "random_forest",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trained classifier of any supported algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", content = "params", rename_all = "snake_case")]
pub enum FittedModel {
    Logistic(LogisticModel),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl FittedModel {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            FittedModel::Logistic(_) => Algorithm::Logistic,
            FittedModel::DecisionTree(_) => Algorithm::DecisionTree,
            FittedModel::RandomForest(_) => Algorithm::RandomForest,
        }
    }
}

impl Classifier for FittedModel {
    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        match self {
            FittedModel::Logistic(m) => m.predict_proba(features),
            FittedModel::DecisionTree(m) => m.predict_proba(features),
            FittedModel::RandomForest(m) => m.predict_proba(features),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_resolve_towards_severity() {
        let p = Prediction::from_probabilities(vec![0.4, 0.1, 0.4, 0.1]);
        assert_eq!(p.label, Label::High);
        assert_eq!(p.confidence, 0.4);
    }

    #[test]
    fn nan_probabilities_never_read_as_low() {
        let p = Prediction::from_probabilities(vec![f64::NAN; 4]);
        assert_eq!(p.label, Label::Critical);
        assert!(!p.is_well_formed());
        let p = Prediction::from_probabilities(vec![0.7, f64::NAN, 0.1, 0.1]);
        assert_ne!(p.label, Label::Low);
        assert!(!p.is_well_formed());
        assert!(Prediction::from_probabilities(vec![0.7, 0.1, 0.1, 0.1]).is_well_formed());
    }

    #[test]
    fn severity_index_spans_unit_interval() {
        let low = Prediction::from_probabilities(vec![1.0, 0.0, 0.0, 0.0]);
        let crit = Prediction::from_probabilities(vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(low.severity_index(), 0.0);
        assert!((crit.severity_index() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn complexity_orders_algorithms() {
        assert!(Algorithm::Logistic.complexity() < Algorithm::DecisionTree.complexity());
        assert!(Algorithm::DecisionTree.complexity() < Algorithm::RandomForest.complexity());
    }
}
