//! Combines the model's prediction with Risk Matrix floors; produces the final label.

use super::{Contribution, Hazard, RiskAssessment, RiskMatrix};
use crate::data::{Adjustment, Observation, ObservationInput};
use crate::error::Result;
use crate::model::ModelArtifact;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    matrix: RiskMatrix,
}

impl RiskEngine {
    pub fn new(matrix: RiskMatrix) -> Self {
        Self { matrix }
    }

    pub fn standard() -> Self {
        Self::new(RiskMatrix::standard())
    }

    pub fn matrix(&self) -> &RiskMatrix {
        &self.matrix
    }

    /// Validate raw input and assess it. Pure: same input and artifact give the
    /// same assessment.
    pub fn assess(&self, input: &ObservationInput, artifact: &ModelArtifact) -> Result<RiskAssessment> {
        let (obs, adjustments) = input.validate()?;
        self.assess_observation(&obs, adjustments, artifact)
    }

    /// Assess an already-validated observation. Values are re-clamped so a
    /// hand-built observation cannot bypass the range invariants; `adjustments`
    /// carries clamps made earlier by the caller.
    pub fn assess_observation(
        &self,
        obs: &Observation,
        mut adjustments: Vec<Adjustment>,
        artifact: &ModelArtifact,
    ) -> Result<RiskAssessment> {
        let (obs, more) = obs.clone().clamped();
        adjustments.extend(more);

        let (prediction, transformed) = artifact.predict(&obs)?;

        let mut explanation: Vec<Contribution> = adjustments
            .iter()
            .map(|a| Contribution::Adjusted {
                field: a.field,
                from: a.from,
                to: a.to,
            })
            .collect();
        explanation.extend(
            transformed
                .imputed
                .iter()
                .map(|&(field, value)| Contribution::Imputed { field, value }),
        );
        explanation.push(Contribution::Model {
            algorithm: artifact.algorithm(),
            label: prediction.label,
            confidence: prediction.confidence,
        });

        let mut label = prediction.label;
        for rule in self.matrix.evaluate(&obs) {
            label = label.max(rule.floor);
            explanation.push(Contribution::Rule {
                rule: rule.name.clone(),
                condition: rule.describe(),
                floor: rule.floor,
            });
        }

        let rule_override = label != prediction.label;
        debug!(
            region = %obs.region,
            model_label = %prediction.label,
            label = %label,
            rule_override,
            "assessed observation"
        );

        Ok(RiskAssessment {
            label,
            score: prediction.confidence,
            model_label: prediction.label,
            severity_index: prediction.severity_index(),
            rule_override,
            explanation,
            hazards: Hazard::detect(&obs),
            recommended_actions: label
                .recommended_actions()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            artifact_id: artifact.id,
            observation: obs,
        })
    }
}

/// Assess with the standard Risk Matrix.
pub fn assess(input: &ObservationInput, artifact: &ModelArtifact) -> Result<RiskAssessment> {
    RiskEngine::standard().assess(input, artifact)
}
