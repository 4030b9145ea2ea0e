//! Final risk categorization: model label, Risk Matrix floors and the explanation trail.

mod engine;
mod matrix;

pub use engine::{assess, RiskEngine};
pub use matrix::{Comparison, Condition, MatrixRule, RiskMatrix};

use crate::data::{Field, Label, Observation};
use crate::model::Algorithm;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One step of the reasoning behind an assessment, in the order it was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Contribution {
    Adjusted {
        field: Field,
        from: f64,
        to: f64,
    },
    Imputed {
        field: Field,
        value: f64,
    },
    Model {
        algorithm: Algorithm,
        label: Label,
        confidence: f64,
    },
    Rule {
        rule: String,
        condition: String,
        floor: Label,
    },
}

impl fmt::Display for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contribution::Adjusted { field, from, to } => {
                write!(f, "{field} clamped from {from} to {to}")
            }
            Contribution::Imputed { field, value } => {
                write!(f, "{field} not provided; used training median {value}")
            }
            Contribution::Model {
                algorithm,
                label,
                confidence,
            } => write!(
                f,
                "{algorithm} model predicted {label} with confidence {:.1}%",
                confidence * 100.0
            ),
            Contribution::Rule {
                rule,
                condition,
                floor,
            } => write!(f, "rule {rule} ({condition}) requires at least {floor}"),
        }
    }
}

/// Hazard tag derived directly from the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Hazard {
    Flood,
    Cyclone,
    Drought,
}

impl Hazard {
    /// Flood on heavy rain, cyclone on gale-force wind, drought on hot dry
    /// weather (with parched soil when soil moisture is known).
    pub fn detect(obs: &Observation) -> Vec<Hazard> {
        let mut hazards = Vec::new();
        if obs.rainfall_mm > 200.0 {
            hazards.push(Hazard::Flood);
        }
        if obs.wind_speed_kmh.is_some_and(|w| w > 80.0) {
            hazards.push(Hazard::Cyclone);
        }
        if obs.rainfall_mm < 10.0
            && obs.temperature_c > 35.0
            && obs.soil_moisture_pct.map_or(true, |s| s < 15.0)
        {
            hazards.push(Hazard::Drought);
        }
        hazards
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Final label: max of the model label and every fired floor
    pub label: Label,
    /// Model confidence in its own predicted class
    pub score: f64,
    pub model_label: Label,
    /// Probability-weighted severity in [0, 1]
    pub severity_index: f64,
    pub rule_override: bool,
    pub explanation: Vec<Contribution>,
    pub hazards: Vec<Hazard>,
    pub recommended_actions: Vec<String>,
    pub artifact_id: Uuid,
    /// The clamped observation that was scored
    pub observation: Observation,
}

impl RiskAssessment {
    /// Names of the matrix rules that fired, in priority order.
    pub fn fired_rules(&self) -> Vec<&str> {
        self.explanation
            .iter()
            .filter_map(|c| match c {
                Contribution::Rule { rule, .. } => Some(rule.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn explanation_lines(&self) -> Vec<String> {
        self.explanation.iter().map(ToString::to_string).collect()
    }
}
