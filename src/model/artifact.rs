//! Trained classifier bundled with its encoder, imputation values and provenance.

use super::{Algorithm, Classifier, Evaluation, FittedModel, Prediction};
use crate::data::Observation;
use crate::error::{Result, RiskError};
use crate::features::{self, Imputation, RegionEncoder, Transformed, FEATURE_NAMES};
use crate::storage::ArtifactStore;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub algorithm: Algorithm,
    pub held_out_accuracy: f64,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
    pub held_out_rows: usize,
    /// Every candidate considered, in configuration order
    pub evaluations: Vec<Evaluation>,
}

/// Immutable once built. The encoder travels with the model so a mismatched
/// pair can never be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub id: Uuid,
    pub model: FittedModel,
    pub encoder: RegionEncoder,
    pub imputation: Imputation,
    pub feature_names: Vec<String>,
    pub metadata: ArtifactMetadata,
}

impl ModelArtifact {
    pub fn new(
        model: FittedModel,
        encoder: RegionEncoder,
        imputation: Imputation,
        metadata: ArtifactMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            model,
            encoder,
            imputation,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            metadata,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.model.algorithm()
    }

    pub fn transform(&self, obs: &Observation) -> Result<Transformed> {
        features::transform(obs, &self.encoder, &self.imputation)
    }

    pub fn predict(&self, obs: &Observation) -> Result<(Prediction, Transformed)> {
        let transformed = self.transform(obs)?;
        let prediction = self.model.predict(transformed.features.as_slice());
        if !prediction.is_well_formed() {
            return Err(RiskError::ModelOutput {
                reason: format!(
                    "artifact {} produced probabilities {:?}",
                    self.id, prediction.probabilities
                ),
            });
        }
        Ok((prediction, transformed))
    }

    /// Reject artifacts whose feature layout differs from this build's.
    pub(crate) fn check_schema(&self, path: &Path) -> Result<()> {
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(RiskError::artifact(
                path,
                format!(
                    "feature layout {:?} does not match {:?}",
                    self.feature_names, FEATURE_NAMES
                ),
            ));
        }
        if self.encoder.is_empty() {
            return Err(RiskError::artifact(path, "encoder has no regions"));
        }
        Ok(())
    }
}

/// Process-wide pointer to the artifact currently used for scoring.
///
/// Readers take an `Arc` snapshot; a swap never disturbs an assessment that
/// is already running against the previous artifact.
pub struct ArtifactHandle {
    current: RwLock<Arc<ModelArtifact>>,
}

impl ArtifactHandle {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self {
            current: RwLock::new(Arc::new(artifact)),
        }
    }

    pub fn current(&self) -> Arc<ModelArtifact> {
        self.current.read().clone()
    }

    /// Install `artifact`, returning the one it replaced.
    pub fn swap(&self, artifact: ModelArtifact) -> Arc<ModelArtifact> {
        let next = Arc::new(artifact);
        let mut guard = self.current.write();
        std::mem::replace(&mut *guard, next)
    }

    /// Re-read the store's current artifact. On failure the handle is unchanged.
    pub fn reload(&self, store: &ArtifactStore) -> Result<Arc<ModelArtifact>> {
        let artifact = store.load_current()?;
        tracing::info!(id = %artifact.id, algorithm = %artifact.algorithm(), "artifact reloaded");
        self.swap(artifact);
        Ok(self.current())
    }
}

#[cfg(test)]
pub(crate) use fixture::humidity_fixture;

#[cfg(test)]
mod fixture {
    use super::*;
    use crate::data::{Dataset, Label, Record, Region};
    use crate::features::transform_dataset;
    use crate::model::{DecisionTree, TreeParams};

    /// Labels depend on humidity alone, so the model's answer is predictable
    /// while the other fields are free to trip matrix rules.
    pub(crate) fn humidity_fixture() -> ModelArtifact {
        let mut records = Vec::new();
        for region in [Region::North, Region::South, Region::East] {
            for h in 0..20 {
                let humidity = h as f64 * 5.0;
                records.push(Record {
                    observation: Observation {
                        region,
                        rainfall_mm: 5.0,
                        temperature_c: 25.0,
                        humidity_pct: humidity,
                        wind_speed_kmh: Some(5.0),
                        soil_moisture_pct: Some(20.0),
                    },
                    label: if humidity < 50.0 { Label::Low } else { Label::Moderate },
                });
            }
        }
        let ds = Dataset::new(records);
        let encoder = RegionEncoder::fit(&ds).unwrap();
        let imputation = Imputation::fit(&ds).unwrap();
        let (x, y) = transform_dataset(&ds, &encoder, &imputation).unwrap();
        let tree = DecisionTree::fit(
            &x,
            &y,
            TreeParams {
                max_depth: 4,
                min_samples_split: 2,
                max_features: None,
            },
        );
        ModelArtifact::new(
            FittedModel::DecisionTree(tree),
            encoder,
            imputation,
            ArtifactMetadata {
                algorithm: Algorithm::DecisionTree,
                held_out_accuracy: 1.0,
                trained_at: chrono::Utc::now(),
                training_rows: ds.len(),
                held_out_rows: 0,
                evaluations: Vec::new(),
            },
        )
    }
}
