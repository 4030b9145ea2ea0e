//! Held-out evaluation of a fitted candidate.

use super::{Algorithm, Classifier};
use crate::data::Label;
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: Label,
    pub precision: f64,
    pub recall: f64,
    /// Held-out rows carrying this label
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub algorithm: Algorithm,
    pub accuracy: f64,
    pub per_class: Vec<ClassMetrics>,
    /// `confusion[actual][predicted]`, indexed by [`Label::index`]
    pub confusion: Vec<Vec<usize>>,
}

impl Evaluation {
    pub fn measure<C: Classifier + ?Sized>(
        algorithm: Algorithm,
        model: &C,
        features: &[FeatureVector],
        labels: &[Label],
    ) -> Self {
        let k = Label::ALL.len();
        let mut confusion = vec![vec![0usize; k]; k];
        for (f, actual) in features.iter().zip(labels) {
            let predicted = model.predict(f.as_slice()).label;
            confusion[actual.index()][predicted.index()] += 1;
        }

        let total: usize = labels.len();
        let correct: usize = (0..k).map(|i| confusion[i][i]).sum();
        let per_class = Label::ALL
            .into_iter()
            .map(|label| {
                let i = label.index();
                let support: usize = confusion[i].iter().sum();
                let predicted: usize = confusion.iter().map(|row| row[i]).sum();
                ClassMetrics {
                    label,
                    precision: ratio(confusion[i][i], predicted),
                    recall: ratio(confusion[i][i], support),
                    support,
                }
            })
            .collect();

        Self {
            algorithm,
            accuracy: ratio(correct, total),
            per_class,
            confusion,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predicts High whenever rainfall exceeds 100.
    struct Threshold;

    impl Classifier for Threshold {
        fn predict_proba(&self, f: &[f64]) -> Vec<f64> {
            if f[1] > 100.0 {
                vec![0.0, 0.0, 1.0, 0.0]
            } else {
                vec![1.0, 0.0, 0.0, 0.0]
            }
        }
    }

    fn fv(rain: f64) -> FeatureVector {
        FeatureVector {
            values: vec![0.0, rain, 25.0, 50.0, 10.0, 40.0],
        }
    }

    #[test]
    fn confusion_and_rates() {
        let x = vec![fv(10.0), fv(200.0), fv(300.0), fv(50.0)];
        let y = vec![Label::Low, Label::High, Label::Low, Label::Moderate];
        let e = Evaluation::measure(Algorithm::DecisionTree, &Threshold, &x, &y);
        assert_eq!(e.accuracy, 0.5);
        assert_eq!(e.confusion[Label::Low.index()][Label::High.index()], 1);
        let low = &e.per_class[Label::Low.index()];
        assert_eq!(low.support, 2);
        assert_eq!(low.recall, 0.5);
        assert_eq!(low.precision, 0.5);
        let high = &e.per_class[Label::High.index()];
        assert_eq!(high.precision, 0.5);
        assert_eq!(high.recall, 1.0);
        assert_eq!(e.per_class[Label::Critical.index()].precision, 0.0);
    }
}
