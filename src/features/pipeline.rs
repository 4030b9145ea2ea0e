//! Observation → feature vector, with median imputation of optional fields.

use super::{FeatureVector, RegionEncoder};
use crate::data::{Dataset, Field, Label, Observation};
use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};

/// Fill-in values for optional fields, fitted as training medians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Imputation {
    pub wind_speed_kmh: f64,
    pub soil_moisture_pct: f64,
}

impl Imputation {
    /// `InsufficientData` when no row carries a value for an optional field.
    pub fn fit(dataset: &Dataset) -> Result<Self> {
        let median_of = |field: Field| {
            let values: Vec<f64> = dataset
                .records()
                .iter()
                .filter_map(|r| r.observation.get(field))
                .collect();
            median(values).ok_or_else(|| {
                RiskError::insufficient(format!("no training row has a value for {field}"))
            })
        };
        Ok(Self {
            wind_speed_kmh: median_of(Field::WindSpeedKmh)?,
            soil_moisture_pct: median_of(Field::SoilMoisturePct)?,
        })
    }

    fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::WindSpeedKmh => Some(self.wind_speed_kmh),
            Field::SoilMoisturePct => Some(self.soil_moisture_pct),
            _ => None,
        }
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Encoded features plus the optional fields that had to be imputed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub features: FeatureVector,
    pub imputed: Vec<(Field, f64)>,
}

pub fn transform(
    obs: &Observation,
    encoder: &RegionEncoder,
    imputation: &Imputation,
) -> Result<Transformed> {
    let code = encoder.encode(obs.region)?;
    let mut values = Vec::with_capacity(super::FEATURE_NAMES.len());
    values.push(f64::from(code));
    let mut imputed = Vec::new();
    for field in Field::ALL {
        let v = match (obs.get(field), imputation.value(field)) {
            (Some(v), _) => v,
            (None, Some(fill)) => {
                imputed.push((field, fill));
                fill
            }
            // required fields are always present on a validated observation
            (None, None) => 0.0,
        };
        values.push(v);
    }
    Ok(Transformed {
        features: FeatureVector { values },
        imputed,
    })
}

/// Encode a whole dataset into parallel feature and label columns.
pub fn transform_dataset(
    dataset: &Dataset,
    encoder: &RegionEncoder,
    imputation: &Imputation,
) -> Result<(Vec<FeatureVector>, Vec<Label>)> {
    let mut features = Vec::with_capacity(dataset.len());
    let mut labels = Vec::with_capacity(dataset.len());
    for r in dataset.records() {
        features.push(transform(&r.observation, encoder, imputation)?.features);
        labels.push(r.label);
    }
    Ok((features, labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{anchor_observation, Record, Region};
    use crate::features::FEATURE_NAMES;

    fn dataset() -> Dataset {
        Dataset::new(
            Label::ALL
                .into_iter()
                .map(|label| Record {
                    observation: anchor_observation(label),
                    label,
                })
                .collect(),
        )
    }

    #[test]
    fn vector_follows_feature_order() {
        let ds = dataset();
        let enc = RegionEncoder::fit(&ds).unwrap();
        let imp = Imputation::fit(&ds).unwrap();
        let obs = anchor_observation(Label::High);
        let t = transform(&obs, &enc, &imp).unwrap();
        assert_eq!(t.features.values.len(), FEATURE_NAMES.len());
        assert_eq!(t.features.values, vec![0.0, 320.0, 27.0, 85.0, 60.0, 75.0]);
        assert_eq!(t.features.numeric().len(), FEATURE_NAMES.len() - 1);
        assert!(t.imputed.is_empty());
    }

    #[test]
    fn missing_optionals_use_training_medians() {
        let ds = dataset();
        let enc = RegionEncoder::fit(&ds).unwrap();
        let imp = Imputation::fit(&ds).unwrap();
        // winds 5, 30, 60, 140; soils 15, 50, 75, 95
        assert_eq!(imp.wind_speed_kmh, 45.0);
        assert_eq!(imp.soil_moisture_pct, 62.5);

        let mut obs = anchor_observation(Label::Low);
        obs.wind_speed_kmh = None;
        obs.soil_moisture_pct = None;
        let t = transform(&obs, &enc, &imp).unwrap();
        assert_eq!(t.features.values[4], 45.0);
        assert_eq!(t.features.values[5], 62.5);
        assert_eq!(
            t.imputed,
            vec![(Field::WindSpeedKmh, 45.0), (Field::SoilMoisturePct, 62.5)]
        );
    }

    #[test]
    fn unknown_region_fails_the_transform() {
        let ds = dataset();
        let enc = RegionEncoder::fit(&ds).unwrap();
        let imp = Imputation::fit(&ds).unwrap();
        let mut obs = anchor_observation(Label::Low);
        obs.region = Region::Northeast;
        assert!(matches!(
            transform(&obs, &enc, &imp),
            Err(RiskError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn optional_field_never_observed_cannot_be_imputed() {
        let mut ds = dataset().records().to_vec();
        for r in &mut ds {
            r.observation.soil_moisture_pct = None;
        }
        assert!(matches!(
            Imputation::fit(&Dataset::new(ds)),
            Err(RiskError::InsufficientData { .. })
        ));
    }
}
