//! Offline training: split, fit every candidate, pick the best on held-out accuracy.

use super::{
    ArtifactMetadata, DecisionTree, Evaluation, FittedModel, LogisticModel, ModelArtifact,
    RandomForest, TreeParams,
};
use crate::config::{CandidateConfig, TrainerConfig};
use crate::data::{Dataset, Label};
use crate::error::{Result, RiskError};
use crate::features::{transform_dataset, FeatureVector, Imputation, RegionEncoder};
use crate::storage::ArtifactStore;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info};

/// Accuracies closer than this are treated as equal during selection.
const ACCURACY_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    /// One entry per candidate, in configuration order
    pub evaluations: Vec<Evaluation>,
}

pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn train(&self, dataset: &Dataset) -> Result<TrainingOutcome> {
        if dataset.is_empty() {
            return Err(RiskError::insufficient("dataset is empty"));
        }
        let labels = dataset.distinct_labels();
        if labels.len() < 2 {
            return Err(RiskError::insufficient(format!(
                "need at least two distinct labels, found {}",
                labels.len()
            )));
        }
        if dataset.len() < 2 {
            return Err(RiskError::insufficient(
                "need at least two rows to hold out a test split",
            ));
        }
        self.validate_config()?;

        let (train, test) = self.split(dataset);
        let train_labels: BTreeSet<Label> =
            train.iter().map(|&i| dataset.records()[i].label).collect();
        if train_labels.len() < 2 {
            return Err(RiskError::insufficient(
                "training split holds a single label; use more rows or a smaller test_ratio",
            ));
        }

        let train_set = subset(dataset, &train);
        let test_set = subset(dataset, &test);
        let encoder = RegionEncoder::fit(dataset)?;
        let imputation = Imputation::fit(&train_set)?;
        let (x_train, y_train) = transform_dataset(&train_set, &encoder, &imputation)?;
        let (x_test, y_test) = transform_dataset(&test_set, &encoder, &imputation)?;

        info!(
            rows = dataset.len(),
            train = train.len(),
            test = test.len(),
            candidates = self.config.candidates.len(),
            "training started"
        );

        let mut evaluations = Vec::with_capacity(self.config.candidates.len());
        let mut best: Option<(FittedModel, usize)> = None;
        for candidate in &self.config.candidates {
            let model = fit_candidate(candidate, &x_train, &y_train, encoder.len());
            let eval = Evaluation::measure(model.algorithm(), &model, &x_test, &y_test);
            info!(algorithm = %eval.algorithm, accuracy = eval.accuracy, "candidate evaluated");

            let better = match &best {
                None => true,
                Some((_, at)) => beats(&eval, &evaluations[*at]),
            };
            evaluations.push(eval);
            if better {
                best = Some((model, evaluations.len() - 1));
            }
        }

        let (model, at) = best
            .ok_or_else(|| RiskError::invalid("trainer.candidates", "no candidates configured"))?;
        let winner = &evaluations[at];
        let metadata = ArtifactMetadata {
            algorithm: winner.algorithm,
            held_out_accuracy: winner.accuracy,
            trained_at: Utc::now(),
            training_rows: train.len(),
            held_out_rows: test.len(),
            evaluations: evaluations.clone(),
        };
        let artifact = ModelArtifact::new(model, encoder, imputation, metadata);
        info!(
            id = %artifact.id,
            algorithm = %artifact.algorithm(),
            accuracy = artifact.metadata.held_out_accuracy,
            "model selected"
        );
        Ok(TrainingOutcome {
            artifact,
            evaluations,
        })
    }

    fn validate_config(&self) -> Result<()> {
        let r = self.config.test_ratio;
        if !(r > 0.0 && r < 1.0) {
            return Err(RiskError::invalid(
                "trainer.test_ratio",
                format!("{r} is outside (0, 1)"),
            ));
        }
        if self.config.candidates.is_empty() {
            return Err(RiskError::invalid("trainer.candidates", "no candidates configured"));
        }
        Ok(())
    }

    /// Seeded shuffle, then the first `round(n * test_ratio)` rows (at least
    /// one, at most n - 1) are held out.
    fn split(&self, dataset: &Dataset) -> (Vec<usize>, Vec<usize>) {
        let n = dataset.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut StdRng::seed_from_u64(self.config.seed));
        let test_n = ((n as f64 * self.config.test_ratio).round() as usize).clamp(1, n - 1);
        let train = order.split_off(test_n);
        debug!(train = train.len(), test = order.len(), "split dataset");
        (train, order)
    }
}

/// Higher accuracy wins; on a tie the simpler algorithm wins; otherwise the
/// earlier candidate is kept.
fn beats(challenger: &Evaluation, incumbent: &Evaluation) -> bool {
    if challenger.accuracy > incumbent.accuracy + ACCURACY_EPSILON {
        return true;
    }
    (challenger.accuracy - incumbent.accuracy).abs() <= ACCURACY_EPSILON
        && challenger.algorithm.complexity() < incumbent.algorithm.complexity()
}

fn fit_candidate(
    candidate: &CandidateConfig,
    x: &[FeatureVector],
    y: &[Label],
    categories: usize,
) -> FittedModel {
    match *candidate {
        CandidateConfig::Logistic {
            epochs,
            learning_rate,
            l2,
        } => FittedModel::Logistic(LogisticModel::fit(x, y, categories, epochs, learning_rate, l2)),
        CandidateConfig::DecisionTree {
            max_depth,
            min_samples_split,
        } => FittedModel::DecisionTree(DecisionTree::fit(
            x,
            y,
            TreeParams {
                max_depth,
                min_samples_split,
                max_features: None,
            },
        )),
        CandidateConfig::RandomForest {
            trees,
            max_depth,
            min_samples_split,
            seed,
        } => FittedModel::RandomForest(RandomForest::fit(
            x,
            y,
            trees,
            max_depth,
            min_samples_split,
            seed,
        )),
    }
}

fn subset(dataset: &Dataset, rows: &[usize]) -> Dataset {
    Dataset::new(rows.iter().map(|&i| dataset.records()[i].clone()).collect())
}

/// Train, then publish the winner as a new artifact version. Nothing is written
/// when training fails.
pub fn train_and_publish(
    trainer: &Trainer,
    dataset: &Dataset,
    store: &ArtifactStore,
) -> Result<(TrainingOutcome, PathBuf)> {
    let outcome = trainer.train(dataset)?;
    let path = store.publish(&outcome.artifact)?;
    Ok((outcome, path))
}
