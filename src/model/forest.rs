//! Bagged ensemble of CART trees with per-split feature subsampling.

use super::tree::{DecisionTree, TreeParams};
use super::Classifier;
use crate::data::Label;
use crate::features::FeatureVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Each tree sees a bootstrap sample and `ceil(sqrt(d))` features per split.
    /// Per-tree seeds are drawn from `seed`, so the ensemble is reproducible.
    pub fn fit(
        features: &[FeatureVector],
        labels: &[Label],
        trees: usize,
        max_depth: usize,
        min_samples_split: usize,
        seed: u64,
    ) -> Self {
        let n = features.len();
        let width = features.first().map_or(0, |f| f.values.len());
        let params = TreeParams {
            max_depth,
            min_samples_split,
            max_features: Some(((width as f64).sqrt().ceil() as usize).max(1)),
        };

        let mut rng = StdRng::seed_from_u64(seed);
        let mut grown = Vec::with_capacity(trees.max(1));
        for _ in 0..trees.max(1) {
            let tree_seed: u64 = rng.gen();
            let rows: Vec<usize> = if n == 0 {
                Vec::new()
            } else {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            };
            grown.push(DecisionTree::grow(
                features,
                labels,
                rows,
                params,
                Some(StdRng::seed_from_u64(tree_seed)),
            ));
        }
        Self { trees: grown }
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

impl Classifier for RandomForest {
    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut mean = vec![0.0; Label::ALL.len()];
        if self.trees.is_empty() {
            mean.fill(1.0 / Label::ALL.len() as f64);
            return mean;
        }
        for tree in &self.trees {
            for (m, p) in mean.iter_mut().zip(tree.predict_proba(features)) {
                *m += p;
            }
        }
        let k = self.trees.len() as f64;
        mean.iter_mut().for_each(|m| *m /= k);
        mean
    }
}
