//! CART classification tree (Gini impurity, midpoint thresholds).

use super::Classifier;
use crate::data::Label;
use crate::features::FeatureVector;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

const CLASSES: usize = Label::ALL.len();

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Features sampled per split; `None` considers all of them
    pub max_features: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Nodes live in an arena; the root is index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Deterministic fit on every row, considering every feature at each split.
    pub fn fit(features: &[FeatureVector], labels: &[Label], params: TreeParams) -> Self {
        let params = TreeParams {
            max_features: None,
            ..params
        };
        Self::grow(features, labels, (0..features.len()).collect(), params, None)
    }

    /// Fit on a (possibly repeated) subset of rows; `rng` drives feature sampling.
    pub(crate) fn grow(
        features: &[FeatureVector],
        labels: &[Label],
        rows: Vec<usize>,
        params: TreeParams,
        rng: Option<StdRng>,
    ) -> Self {
        let mut builder = Builder {
            features,
            labels,
            params,
            rng,
            nodes: Vec::new(),
        };
        builder.build(&rows, 0);
        Self {
            nodes: builder.nodes,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match &nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

impl Classifier for DecisionTree {
    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut at = 0;
        loop {
            match self.nodes.get(at) {
                Some(Node::Leaf { distribution }) => return distribution.clone(),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = features.get(*feature).copied().unwrap_or(0.0);
                    at = if v <= *threshold { *left } else { *right };
                }
                None => return vec![1.0 / CLASSES as f64; CLASSES],
            }
        }
    }
}

struct Builder<'a> {
    features: &'a [FeatureVector],
    labels: &'a [Label],
    params: TreeParams,
    rng: Option<StdRng>,
    nodes: Vec<Node>,
}

impl Builder<'_> {
    fn build(&mut self, rows: &[usize], depth: usize) -> usize {
        let counts = self.counts(rows);
        let distribution = normalise(&counts);
        let pure = counts.iter().filter(|c| **c > 0).count() <= 1;

        let split = if pure
            || depth >= self.params.max_depth
            || rows.len() < self.params.min_samples_split.max(2)
        {
            None
        } else {
            self.best_split(rows, &counts)
        };

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { distribution });
        let Some((feature, threshold)) = split else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&r| self.features[r].values[feature] <= threshold);
        let left = self.build(&left_rows, depth + 1);
        let right = self.build(&right_rows, depth + 1);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn counts(&self, rows: &[usize]) -> [usize; CLASSES] {
        let mut counts = [0; CLASSES];
        for &r in rows {
            counts[self.labels[r].index()] += 1;
        }
        counts
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let width = self.features.first().map_or(0, |f| f.values.len());
        match (self.params.max_features, self.rng.as_mut()) {
            (Some(k), Some(rng)) if k < width => {
                let mut chosen = rand::seq::index::sample(rng, width, k).into_vec();
                chosen.sort_unstable();
                chosen
            }
            _ => (0..width).collect(),
        }
    }

    /// Lowest weighted Gini over all candidate thresholds, if it beats the parent.
    fn best_split(&mut self, rows: &[usize], parent: &[usize; CLASSES]) -> Option<(usize, f64)> {
        let n = rows.len();
        let mut best_impurity = gini(parent, n) - 1e-12;
        let mut best = None;

        for feature in self.candidate_features() {
            let mut column: Vec<(f64, usize)> = rows
                .iter()
                .map(|&r| (self.features[r].values[feature], self.labels[r].index()))
                .collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = [0usize; CLASSES];
            for pos in 0..n - 1 {
                left[column[pos].1] += 1;
                if column[pos].0 == column[pos + 1].0 {
                    continue;
                }
                let mut right = *parent;
                for (r, l) in right.iter_mut().zip(&left) {
                    *r -= l;
                }
                let nl = pos + 1;
                let nr = n - nl;
                let impurity = (nl as f64 * gini(&left, nl) + nr as f64 * gini(&right, nr)) / n as f64;
                if impurity < best_impurity {
                    best_impurity = impurity;
                    best = Some((feature, (column[pos].0 + column[pos + 1].0) / 2.0));
                }
            }
        }
        best
    }
}

fn gini(counts: &[usize; CLASSES], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

fn normalise(counts: &[usize; CLASSES]) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![1.0 / CLASSES as f64; CLASSES];
    }
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}
