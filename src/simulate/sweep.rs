//! Single-field sweeps and the label transitions along them.

use super::{carried, Simulator, ValueRange};
use crate::data::{Adjustment, Field, Label, Observation};
use crate::error::{Result, RiskError};
use crate::model::ModelArtifact;
use crate::risk::RiskAssessment;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Requested value, before clamping
    pub value: f64,
    pub assessment: RiskAssessment,
}

/// Adjacent sweep points whose final labels differ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub below: f64,
    pub above: f64,
    pub from: Label,
    pub to: Label,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub field: Field,
    /// One point per requested value, ascending
    pub points: Vec<SweepPoint>,
}

impl SweepReport {
    pub fn labels(&self) -> Vec<Label> {
        self.points.iter().map(|p| p.assessment.label).collect()
    }

    pub fn transitions(&self) -> Vec<Transition> {
        self.points
            .windows(2)
            .filter(|w| w[0].assessment.label != w[1].assessment.label)
            .map(|w| Transition {
                below: w[0].value,
                above: w[1].value,
                from: w[0].assessment.label,
                to: w[1].assessment.label,
            })
            .collect()
    }
}

impl Simulator {
    /// Vary `field` over `range` with every other field held at `base`.
    /// Any failure aborts the whole sweep.
    pub fn sweep(
        &self,
        base: &Observation,
        field: Field,
        range: &ValueRange,
        artifact: &ModelArtifact,
    ) -> Result<SweepReport> {
        self.sweep_from(base, &[], field, range, artifact)
    }

    /// As [`Simulator::sweep`], with clamps already made to `base` carried
    /// into each point's explanation.
    pub fn sweep_from(
        &self,
        base: &Observation,
        base_adjustments: &[Adjustment],
        field: Field,
        range: &ValueRange,
        artifact: &ModelArtifact,
    ) -> Result<SweepReport> {
        if range.len() > self.max_sweep_points() {
            return Err(RiskError::invalid(
                "sweep",
                format!(
                    "{} values exceeds the limit of {}",
                    range.len(),
                    self.max_sweep_points()
                ),
            ));
        }
        let inherited = carried(base_adjustments, |f| f == field);
        let mut points = Vec::with_capacity(range.len());
        for &value in range.values() {
            let (obs, adjustment) = base.with(field, value);
            let mut adjustments = inherited.clone();
            adjustments.extend(adjustment);
            let assessment = self.engine().assess_observation(&obs, adjustments, artifact)?;
            points.push(SweepPoint { value, assessment });
        }
        let report = SweepReport { field, points };
        info!(
            field = %field,
            points = report.points.len(),
            transitions = report.transitions().len(),
            "sweep complete"
        );
        Ok(report)
    }
}
