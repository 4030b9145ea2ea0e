//! Raw and validated observations, the numeric field catalogue and clamping.

use super::Region;
use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unvalidated input as received from a caller (form, CLI flags, JSON body).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationInput {
    pub region: String,
    pub rainfall_mm: Option<f64>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub soil_moisture_pct: Option<f64>,
}

/// A validated observation whose numeric fields satisfy the range invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub region: Region,
    pub rainfall_mm: f64,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_kmh: Option<f64>,
    pub soil_moisture_pct: Option<f64>,
}

/// A value that was pulled back into range during validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub field: Field,
    pub from: f64,
    pub to: f64,
}

/// Numeric observation fields, in feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    RainfallMm,
    TemperatureC,
    HumidityPct,
    WindSpeedKmh,
    SoilMoisturePct,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::RainfallMm,
        Field::TemperatureC,
        Field::HumidityPct,
        Field::WindSpeedKmh,
        Field::SoilMoisturePct,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::RainfallMm => "rainfall_mm",
            Field::TemperatureC => "temperature_c",
            Field::HumidityPct => "humidity_pct",
            Field::WindSpeedKmh => "wind_speed_kmh",
            Field::SoilMoisturePct => "soil_moisture_pct",
        }
    }

    pub fn is_required(self) -> bool {
        matches!(
            self,
            Field::RainfallMm | Field::TemperatureC | Field::HumidityPct
        )
    }

    /// Pull `value` into the field's valid range. Idempotent.
    pub fn clamp(self, value: f64) -> f64 {
        match self {
            Field::RainfallMm | Field::WindSpeedKmh => value.max(0.0),
            Field::HumidityPct | Field::SoilMoisturePct => value.clamp(0.0, 100.0),
            Field::TemperatureC => value,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        let field = match key.as_str() {
            "rainfall_mm" | "rainfall" => Field::RainfallMm,
            "temperature_c" | "temperature" => Field::TemperatureC,
            "humidity_pct" | "humidity" => Field::HumidityPct,
            "wind_speed_kmh" | "wind_speed" | "wind" => Field::WindSpeedKmh,
            "soil_moisture_pct" | "soil_moisture" | "soil" => Field::SoilMoisturePct,
            "region" => {
                return Err(RiskError::invalid(
                    "region",
                    "categorical field cannot be varied numerically",
                ))
            }
            _ => {
                return Err(RiskError::invalid(
                    s,
                    "not a field of the observation schema",
                ))
            }
        };
        Ok(field)
    }
}

impl ObservationInput {
    /// Validate and clamp. Missing required fields and non-finite numbers are
    /// errors; out-of-range numbers are clamped and reported.
    pub fn validate(&self) -> Result<(Observation, Vec<Adjustment>)> {
        if self.region.trim().is_empty() {
            return Err(RiskError::invalid("region", "missing required field"));
        }
        let region: Region = self.region.parse()?;

        let rainfall_mm = required(Field::RainfallMm, self.rainfall_mm)?;
        let temperature_c = required(Field::TemperatureC, self.temperature_c)?;
        let humidity_pct = required(Field::HumidityPct, self.humidity_pct)?;
        let wind_speed_kmh = optional(Field::WindSpeedKmh, self.wind_speed_kmh)?;
        let soil_moisture_pct = optional(Field::SoilMoisturePct, self.soil_moisture_pct)?;

        Ok(Observation {
            region,
            rainfall_mm,
            temperature_c,
            humidity_pct,
            wind_speed_kmh,
            soil_moisture_pct,
        }
        .clamped())
    }
}

fn required(field: Field, value: Option<f64>) -> Result<f64> {
    optional(field, value)?
        .ok_or_else(|| RiskError::invalid(field.as_str(), "missing required field"))
}

fn optional(field: Field, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() => Err(RiskError::invalid(
            field.as_str(),
            format!("`{v}` is not a finite number"),
        )),
        other => Ok(other),
    }
}

impl Observation {
    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::RainfallMm => Some(self.rainfall_mm),
            Field::TemperatureC => Some(self.temperature_c),
            Field::HumidityPct => Some(self.humidity_pct),
            Field::WindSpeedKmh => self.wind_speed_kmh,
            Field::SoilMoisturePct => self.soil_moisture_pct,
        }
    }

    /// Copy with `field` set to `value`, clamped into range.
    pub fn with(&self, field: Field, value: f64) -> (Self, Option<Adjustment>) {
        let to = field.clamp(value);
        let mut next = self.clone();
        match field {
            Field::RainfallMm => next.rainfall_mm = to,
            Field::TemperatureC => next.temperature_c = to,
            Field::HumidityPct => next.humidity_pct = to,
            Field::WindSpeedKmh => next.wind_speed_kmh = Some(to),
            Field::SoilMoisturePct => next.soil_moisture_pct = Some(to),
        }
        let adjustment = (to != value).then_some(Adjustment {
            field,
            from: value,
            to,
        });
        (next, adjustment)
    }

    /// Clamp every present numeric field, returning what changed.
    pub fn clamped(self) -> (Self, Vec<Adjustment>) {
        let mut obs = self;
        let mut adjustments = Vec::new();
        for field in Field::ALL {
            if let Some(v) = obs.get(field) {
                let (next, adj) = obs.with(field, v);
                obs = next;
                adjustments.extend(adj);
            }
        }
        (obs, adjustments)
    }
}
