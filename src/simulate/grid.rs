//! Multi-field What-If grids over the cartesian product of several ranges.

use super::{carried, Simulator, ValueRange};
use crate::data::{Adjustment, Field, Observation};
use crate::error::{Result, RiskError};
use crate::model::ModelArtifact;
use crate::risk::RiskAssessment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// Requested values, one per varied field, in field order
    pub inputs: Vec<(Field, f64)>,
    pub assessment: RiskAssessment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridReport {
    pub fields: Vec<Field>,
    /// Cartesian product, lexicographic by field then value
    pub points: Vec<GridPoint>,
}

impl GridReport {
    /// Look up one combination; the order of `inputs` does not matter.
    pub fn get(&self, inputs: &[(Field, f64)]) -> Option<&RiskAssessment> {
        let mut key = inputs.to_vec();
        key.sort_by_key(|(f, _)| *f);
        self.points
            .iter()
            .find(|p| p.inputs == key)
            .map(|p| &p.assessment)
    }
}

impl Simulator {
    /// Evaluate every combination of the given ranges. The combination count
    /// is checked against the configured bound before anything is scored.
    pub fn grid(
        &self,
        base: &Observation,
        fields: &BTreeMap<Field, ValueRange>,
        artifact: &ModelArtifact,
    ) -> Result<GridReport> {
        self.grid_from(base, &[], fields, artifact)
    }

    /// As [`Simulator::grid`], with clamps already made to `base` carried
    /// into each point's explanation.
    pub fn grid_from(
        &self,
        base: &Observation,
        base_adjustments: &[Adjustment],
        fields: &BTreeMap<Field, ValueRange>,
        artifact: &ModelArtifact,
    ) -> Result<GridReport> {
        if fields.is_empty() {
            return Err(RiskError::invalid("grid", "no fields to vary"));
        }
        let total = fields
            .values()
            .try_fold(1usize, |acc, r| acc.checked_mul(r.len()))
            .filter(|n| *n <= self.max_grid_points())
            .ok_or_else(|| {
                RiskError::invalid(
                    "grid",
                    format!("combination count exceeds the limit of {}", self.max_grid_points()),
                )
            })?;

        let inherited = carried(base_adjustments, |f| fields.contains_key(&f));
        let axes: Vec<(Field, &[f64])> = fields.iter().map(|(f, r)| (*f, r.values())).collect();
        let mut cursor = vec![0usize; axes.len()];
        let mut points = Vec::with_capacity(total);
        for _ in 0..total {
            let mut obs = base.clone();
            let mut adjustments = inherited.clone();
            let mut inputs = Vec::with_capacity(axes.len());
            for ((field, values), &i) in axes.iter().zip(&cursor) {
                let (next, adj) = obs.with(*field, values[i]);
                obs = next;
                adjustments.extend(adj);
                inputs.push((*field, values[i]));
            }
            let assessment = self.engine().assess_observation(&obs, adjustments, artifact)?;
            points.push(GridPoint { inputs, assessment });

            // odometer: the last field varies fastest
            for axis in (0..axes.len()).rev() {
                cursor[axis] += 1;
                if cursor[axis] < axes[axis].1.len() {
                    break;
                }
                cursor[axis] = 0;
            }
        }

        info!(fields = axes.len(), points = points.len(), "grid complete");
        Ok(GridReport {
            fields: axes.iter().map(|(f, _)| *f).collect(),
            points,
        })
    }
}
