//! Expert-rule floors applied on top of the model's label.

use crate::data::{Field, Label, Observation};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Strictly greater
    Above,
    /// Greater or equal
    AtLeast,
    /// Strictly less
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: Field,
    pub op: Comparison,
    pub value: f64,
}

impl Condition {
    pub fn new(field: Field, op: Comparison, value: f64) -> Self {
        Self { field, op, value }
    }

    /// An absent optional field never satisfies a condition.
    pub fn holds(&self, obs: &Observation) -> bool {
        match obs.get(self.field) {
            Some(v) => match self.op {
                Comparison::Above => v > self.value,
                Comparison::AtLeast => v >= self.value,
                Comparison::Below => v < self.value,
            },
            None => false,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            Comparison::Above => ">",
            Comparison::AtLeast => ">=",
            Comparison::Below => "<",
        };
        write!(f, "{} {} {}", self.field, op, self.value)
    }
}

/// Fires when every condition holds; forces the label to at least `floor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRule {
    pub name: String,
    pub conditions: Vec<Condition>,
    pub floor: Label,
}

impl MatrixRule {
    pub fn new(name: &str, conditions: Vec<Condition>, floor: Label) -> Self {
        Self {
            name: name.to_string(),
            conditions,
            floor,
        }
    }

    pub fn fires(&self, obs: &Observation) -> bool {
        !self.conditions.is_empty() && self.conditions.iter().all(|c| c.holds(obs))
    }

    /// Conditions joined with "and", e.g. `soil_moisture_pct > 90 and rainfall_mm > 100`.
    pub fn describe(&self) -> String {
        self.conditions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

/// Ordered rule list; order only affects reporting, the reduction is max-severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskMatrix {
    rules: Vec<MatrixRule>,
}

impl Default for RiskMatrix {
    fn default() -> Self {
        Self::standard()
    }
}

impl RiskMatrix {
    pub fn new(rules: Vec<MatrixRule>) -> Self {
        Self { rules }
    }

    pub fn standard() -> Self {
        use Comparison::*;
        use Field::*;
        Self::new(vec![
            MatrixRule::new(
                "cyclonic-wind",
                vec![Condition::new(WindSpeedKmh, AtLeast, 120.0)],
                Label::Critical,
            ),
            MatrixRule::new(
                "saturated-ground",
                vec![
                    Condition::new(SoilMoisturePct, Above, 90.0),
                    Condition::new(RainfallMm, Above, 100.0),
                ],
                Label::Critical,
            ),
            MatrixRule::new(
                "extreme-rainfall",
                vec![Condition::new(RainfallMm, Above, 400.0)],
                Label::High,
            ),
            MatrixRule::new(
                "heavy-rain-humid",
                vec![
                    Condition::new(RainfallMm, Above, 200.0),
                    Condition::new(HumidityPct, Above, 80.0),
                ],
                Label::High,
            ),
            MatrixRule::new(
                "gale-force-wind",
                vec![Condition::new(WindSpeedKmh, Above, 80.0)],
                Label::High,
            ),
            MatrixRule::new(
                "heatwave-drought",
                vec![
                    Condition::new(TemperatureC, Above, 45.0),
                    Condition::new(RainfallMm, Below, 10.0),
                ],
                Label::Moderate,
            ),
            MatrixRule::new(
                "wet-soil-watch",
                vec![
                    Condition::new(SoilMoisturePct, Above, 80.0),
                    Condition::new(RainfallMm, Above, 100.0),
                ],
                Label::Moderate,
            ),
        ])
    }

    pub fn rules(&self) -> &[MatrixRule] {
        &self.rules
    }

    /// Rules that fire for `obs`, in priority order.
    pub fn evaluate<'a>(&'a self, obs: &Observation) -> Vec<&'a MatrixRule> {
        self.rules.iter().filter(|r| r.fires(obs)).collect()
    }

    /// Highest floor among fired rules.
    pub fn floor(&self, obs: &Observation) -> Option<Label> {
        self.evaluate(obs).into_iter().map(|r| r.floor).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Region;

    fn obs(rain: f64, temp: f64, hum: f64, wind: Option<f64>, soil: Option<f64>) -> Observation {
        Observation {
            region: Region::East,
            rainfall_mm: rain,
            temperature_c: temp,
            humidity_pct: hum,
            wind_speed_kmh: wind,
            soil_moisture_pct: soil,
        }
    }

    fn fired(m: &RiskMatrix, o: &Observation) -> Vec<String> {
        m.evaluate(o).into_iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn calm_conditions_fire_nothing() {
        let m = RiskMatrix::standard();
        let o = obs(20.0, 28.0, 50.0, Some(10.0), Some(30.0));
        assert!(m.evaluate(&o).is_empty());
        assert_eq!(m.floor(&o), None);
    }

    #[test]
    fn wind_boundaries() {
        let m = RiskMatrix::standard();
        assert_eq!(m.floor(&obs(0.0, 25.0, 40.0, Some(80.0), None)), None);
        assert_eq!(m.floor(&obs(0.0, 25.0, 40.0, Some(80.5), None)), Some(Label::High));
        assert_eq!(
            fired(&m, &obs(0.0, 25.0, 40.0, Some(120.0), None)),
            vec!["cyclonic-wind", "gale-force-wind"]
        );
        assert_eq!(m.floor(&obs(0.0, 25.0, 40.0, Some(120.0), None)), Some(Label::Critical));
    }

    #[test]
    fn absent_optional_field_never_fires() {
        let m = RiskMatrix::standard();
        let o = obs(150.0, 25.0, 60.0, None, None);
        assert!(m.evaluate(&o).is_empty());
        let wet = obs(150.0, 25.0, 60.0, None, Some(95.0));
        assert_eq!(fired(&m, &wet), vec!["saturated-ground", "wet-soil-watch"]);
    }

    #[test]
    fn heatwave_and_humid_rain() {
        let m = RiskMatrix::standard();
        assert_eq!(m.floor(&obs(2.0, 46.0, 15.0, None, None)), Some(Label::Moderate));
        assert_eq!(m.floor(&obs(250.0, 30.0, 85.0, None, None)), Some(Label::High));
        assert_eq!(m.floor(&obs(250.0, 30.0, 80.0, None, None)), None);
    }

    #[test]
    fn descriptions_read_as_conditions() {
        let m = RiskMatrix::standard();
        assert_eq!(m.rules()[1].describe(), "soil_moisture_pct > 90 and rainfall_mm > 100");
        assert_eq!(m.rules()[0].describe(), "wind_speed_kmh >= 120");
    }

    #[test]
    fn matrix_is_configurable_as_data() {
        let json = r#"[{"name":"any-rain","conditions":[{"field":"rainfall_mm","op":"above","value":1.0}],"floor":"Moderate"}]"#;
        let m: RiskMatrix = serde_json::from_str(json).unwrap();
        assert_eq!(m.floor(&obs(5.0, 20.0, 20.0, None, None)), Some(Label::Moderate));
        let round: RiskMatrix =
            serde_json::from_str(&serde_json::to_string(&RiskMatrix::standard()).unwrap()).unwrap();
        assert_eq!(round, RiskMatrix::standard());
    }
}
