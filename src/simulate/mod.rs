//! What-If simulation: re-score an observation while varying one or more fields.

mod grid;
mod sweep;

pub use grid::{GridPoint, GridReport};
pub use sweep::{SweepPoint, SweepReport, Transition};

use crate::config::{RiskConfig, SimulationConfig};
use crate::data::{Adjustment, Field, Observation, ObservationInput};
use crate::error::{Result, RiskError};
use crate::model::ModelArtifact;
use crate::risk::RiskEngine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Most values a single range may expand to.
pub const MAX_RANGE_VALUES: usize = 1_000_000;

/// Finite, non-empty, strictly ascending list of values to try.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ValueRange {
    values: Vec<f64>,
}

impl ValueRange {
    /// `start, start + step, ...` up to and including `end`.
    pub fn stepped(start: f64, end: f64, step: f64) -> Result<Self> {
        if !(start.is_finite() && end.is_finite() && step.is_finite()) {
            return Err(RiskError::invalid("range", "bounds and step must be finite"));
        }
        if step <= 0.0 {
            return Err(RiskError::invalid("range", format!("step {step} must be positive")));
        }
        if end < start {
            return Err(RiskError::invalid("range", format!("end {end} is below start {start}")));
        }
        let count = ((end - start) / step + 1e-9).floor() + 1.0;
        if count > MAX_RANGE_VALUES as f64 {
            return Err(RiskError::invalid(
                "range",
                format!("{start}:{end}:{step} expands past {MAX_RANGE_VALUES} values"),
            ));
        }
        let mut values: Vec<f64> = (0..count as usize).map(|i| start + i as f64 * step).collect();
        if let Some(last) = values.last_mut() {
            *last = last.min(end);
        }
        Self::explicit(values)
    }

    /// `n` evenly spaced values from `start` to `end` inclusive.
    pub fn linspace(start: f64, end: f64, n: usize) -> Result<Self> {
        if n > MAX_RANGE_VALUES {
            return Err(RiskError::invalid(
                "range",
                format!("{n} values is more than {MAX_RANGE_VALUES}"),
            ));
        }
        match n {
            0 => Err(RiskError::invalid("range", "at least one value is required")),
            1 => Self::explicit(vec![start]),
            _ => {
                let width = (end - start) / (n - 1) as f64;
                let mut values: Vec<f64> = (0..n).map(|i| start + i as f64 * width).collect();
                values[n - 1] = end;
                Self::explicit(values)
            }
        }
    }

    pub fn explicit(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(RiskError::invalid("range", "at least one value is required"));
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(RiskError::invalid("range", format!("`{v}` is not a finite number")));
        }
        if values.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RiskError::invalid("range", "values must be strictly ascending"));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl TryFrom<Vec<f64>> for ValueRange {
    type Error = RiskError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::explicit(values)
    }
}

impl From<ValueRange> for Vec<f64> {
    fn from(range: ValueRange) -> Self {
        range.values
    }
}

impl FromStr for ValueRange {
    type Err = RiskError;

    /// `start:end:step`, or a comma-separated list such as `0,50,100`.
    fn from_str(s: &str) -> Result<Self> {
        let number = |p: &str| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| RiskError::invalid("range", format!("`{p}` is not a number")))
        };
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [start, end, step] => Self::stepped(number(start)?, number(end)?, number(step)?),
            [list] => Self::explicit(list.split(',').map(number).collect::<Result<_>>()?),
            _ => Err(RiskError::invalid(
                "range",
                format!("`{s}` is neither start:end:step nor a comma-separated list"),
            )),
        }
    }
}

/// Runs sweeps and grids against one engine, with caps on how many points
/// either may evaluate.
#[derive(Debug, Clone)]
pub struct Simulator {
    engine: RiskEngine,
    limits: SimulationConfig,
}

impl Simulator {
    pub fn new(engine: RiskEngine, limits: SimulationConfig) -> Self {
        Self { engine, limits }
    }

    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(RiskEngine::new(config.matrix.clone()), config.simulation.clone())
    }

    pub fn engine(&self) -> &RiskEngine {
        &self.engine
    }

    pub fn max_grid_points(&self) -> usize {
        self.limits.max_grid_points
    }

    pub fn max_sweep_points(&self) -> usize {
        self.limits.max_sweep_points
    }

    /// Validate `input` as the baseline, then sweep. Clamps made to the
    /// baseline show up in every point's explanation.
    pub fn sweep_input(
        &self,
        input: &ObservationInput,
        field: Field,
        range: &ValueRange,
        artifact: &ModelArtifact,
    ) -> Result<SweepReport> {
        let (base, adjustments) = input.validate()?;
        self.sweep_from(&base, &adjustments, field, range, artifact)
    }

    /// Validate `input` as the baseline, then run the grid.
    pub fn grid_input(
        &self,
        input: &ObservationInput,
        fields: &BTreeMap<Field, ValueRange>,
        artifact: &ModelArtifact,
    ) -> Result<GridReport> {
        let (base, adjustments) = input.validate()?;
        self.grid_from(&base, &adjustments, fields, artifact)
    }
}

/// Baseline clamps that still apply once `varied` fields are overridden.
fn carried(adjustments: &[Adjustment], varied: impl Fn(Field) -> bool) -> Vec<Adjustment> {
    adjustments
        .iter()
        .filter(|a| !varied(a.field))
        .copied()
        .collect()
}

/// Build a grid's field map, rejecting a field named twice.
pub fn axes(pairs: impl IntoIterator<Item = (Field, ValueRange)>) -> Result<BTreeMap<Field, ValueRange>> {
    let mut fields = BTreeMap::new();
    for (field, range) in pairs {
        if fields.insert(field, range).is_some() {
            return Err(RiskError::invalid(field.as_str(), "varied more than once"));
        }
    }
    Ok(fields)
}

/// Single-field sweep with the standard matrix and default limits.
pub fn sweep(
    base: &Observation,
    field: Field,
    range: &ValueRange,
    artifact: &ModelArtifact,
) -> Result<SweepReport> {
    Simulator::new(RiskEngine::standard(), SimulationConfig::default()).sweep(base, field, range, artifact)
}

/// Multi-field grid with the standard matrix, bounded by `max_points`.
pub fn grid(
    base: &Observation,
    fields: &BTreeMap<Field, ValueRange>,
    artifact: &ModelArtifact,
    max_points: usize,
) -> Result<GridReport> {
    let limits = SimulationConfig {
        max_grid_points: max_points,
        ..SimulationConfig::default()
    };
    Simulator::new(RiskEngine::standard(), limits).grid(base, fields, artifact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepped_includes_the_end() {
        let r = ValueRange::stepped(0.0, 100.0, 25.0).unwrap();
        assert_eq!(r.values(), &[0.0, 25.0, 50.0, 75.0, 100.0]);
        let r = ValueRange::stepped(0.0, 0.3, 0.1).unwrap();
        assert_eq!(r.len(), 4);
        assert_eq!(r.values()[3], 0.3);
        let r = ValueRange::stepped(0.0, 90.0, 25.0).unwrap();
        assert_eq!(r.values(), &[0.0, 25.0, 50.0, 75.0]);
    }

    #[test]
    fn linspace_hits_both_ends() {
        let r = ValueRange::linspace(10.0, 20.0, 3).unwrap();
        assert_eq!(r.values(), &[10.0, 15.0, 20.0]);
        assert_eq!(ValueRange::linspace(5.0, 9.0, 1).unwrap().values(), &[5.0]);
    }

    #[test]
    fn rejects_bad_ranges() {
        for r in [
            ValueRange::stepped(0.0, 10.0, 0.0),
            ValueRange::stepped(10.0, 0.0, 1.0),
            ValueRange::stepped(0.0, f64::INFINITY, 1.0),
            ValueRange::linspace(0.0, 1.0, 0),
            ValueRange::linspace(1.0, 1.0, 2),
            ValueRange::explicit(Vec::new()),
            ValueRange::explicit(vec![1.0, 1.0]),
            ValueRange::explicit(vec![2.0, 1.0]),
            ValueRange::explicit(vec![f64::NAN]),
        ] {
            assert!(matches!(r, Err(RiskError::InvalidInput { .. })));
        }
    }

    #[test]
    fn oversized_ranges_are_rejected_not_allocated() {
        for r in [
            ValueRange::stepped(0.0, 1e300, 1.0),
            ValueRange::stepped(0.0, 1e10, 1.0),
            "0:1e300:1".parse::<ValueRange>(),
            ValueRange::linspace(0.0, 1.0, MAX_RANGE_VALUES + 1),
        ] {
            assert!(matches!(r, Err(RiskError::InvalidInput { .. })));
        }
        assert_eq!(
            ValueRange::stepped(0.0, 999_999.0, 1.0).unwrap().len(),
            MAX_RANGE_VALUES
        );
    }

    #[test]
    fn a_field_varied_twice_is_rejected() {
        let r = || ValueRange::explicit(vec![1.0, 2.0]).unwrap();
        let fields = axes([(Field::RainfallMm, r()), (Field::HumidityPct, r())]).unwrap();
        assert_eq!(fields.len(), 2);
        assert!(matches!(
            axes([(Field::RainfallMm, r()), (Field::RainfallMm, r())]),
            Err(RiskError::InvalidInput { .. })
        ));
    }

    #[test]
    fn parses_cli_notation() {
        assert_eq!(
            "0:200:100".parse::<ValueRange>().unwrap().values(),
            &[0.0, 100.0, 200.0]
        );
        assert_eq!("5, 10,40".parse::<ValueRange>().unwrap().values(), &[5.0, 10.0, 40.0]);
        assert!("1:2".parse::<ValueRange>().is_err());
        assert!("a,b".parse::<ValueRange>().is_err());
    }
}
