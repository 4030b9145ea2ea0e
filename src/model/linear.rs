//! Multinomial logistic regression trained by full-batch gradient descent.
//!
//! The region code is one-hot expanded; numeric columns are z-scored with
//! statistics from the training rows.

use super::Classifier;
use crate::data::Label;
use crate::features::{FeatureVector, REGION_COLUMN};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// Width of the one-hot block for the region code
    categories: usize,
    means: Vec<f64>,
    scales: Vec<f64>,
    /// (design width, classes)
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl LogisticModel {
    pub fn fit(
        features: &[FeatureVector],
        labels: &[Label],
        categories: usize,
        epochs: usize,
        learning_rate: f64,
        l2: f64,
    ) -> Self {
        let n = features.len();
        let numeric = features.first().map_or(0, |f| f.numeric().len());
        let (means, scales) = standardisation(features, numeric);

        let mut model = Self {
            categories,
            means,
            scales,
            weights: Array2::zeros((categories + numeric, Label::ALL.len())),
            bias: Array1::zeros(Label::ALL.len()),
        };
        if n == 0 {
            return model;
        }

        let mut x: Array2<f64> = Array2::zeros((n, categories + numeric));
        let mut y: Array2<f64> = Array2::zeros((n, Label::ALL.len()));
        for (i, (f, label)) in features.iter().zip(labels).enumerate() {
            x.row_mut(i).assign(&model.design_row(f.as_slice()));
            y[[i, label.index()]] = 1.0;
        }

        let nf = n as f64;
        for _ in 0..epochs {
            let mut probs = x.dot(&model.weights);
            probs += &model.bias;
            for mut row in probs.rows_mut() {
                softmax_in_place(row.view_mut());
            }
            let diff = &probs - &y;
            let grad_w = x.t().dot(&diff) / nf + &model.weights * l2;
            let grad_b = diff.sum_axis(Axis(0)) / nf;
            model.weights.scaled_add(-learning_rate, &grad_w);
            model.bias.scaled_add(-learning_rate, &grad_b);
        }
        model
    }

    fn design_row(&self, x: &[f64]) -> Array1<f64> {
        let mut row = Array1::zeros(self.categories + self.means.len());
        let code = x.get(REGION_COLUMN).copied().unwrap_or(-1.0);
        if code >= 0.0 && (code as usize) < self.categories {
            row[code as usize] = 1.0;
        }
        for (j, (mean, scale)) in self.means.iter().zip(&self.scales).enumerate() {
            let v = x.get(REGION_COLUMN + 1 + j).copied().unwrap_or(*mean);
            row[self.categories + j] = (v - mean) / scale;
        }
        row
    }
}

impl Classifier for LogisticModel {
    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut z = self.design_row(features).dot(&self.weights) + &self.bias;
        softmax_in_place(z.view_mut());
        z.to_vec()
    }
}

fn standardisation(features: &[FeatureVector], width: usize) -> (Vec<f64>, Vec<f64>) {
    let n = features.len().max(1) as f64;
    let mut means = vec![0.0; width];
    for f in features {
        for (m, v) in means.iter_mut().zip(f.numeric()) {
            *m += v / n;
        }
    }
    let mut scales = vec![0.0; width];
    for f in features {
        for ((s, v), m) in scales.iter_mut().zip(f.numeric()).zip(&means) {
            *s += (v - m).powi(2) / n;
        }
    }
    for s in &mut scales {
        *s = if *s > 1e-12 { s.sqrt() } else { 1.0 };
    }
    (means, scales)
}

fn softmax_in_place(mut row: ndarray::ArrayViewMut1<'_, f64>) {
    let max = row.fold(f64::NEG_INFINITY, |a, &v| a.max(v));
    row.mapv_inplace(|v| (v - max).exp());
    let sum = row.sum();
    row /= sum;
}
