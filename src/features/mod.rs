//! Feature encoding: region codes, optional-field imputation and fixed-order vectors.

mod encoder;
mod pipeline;

pub use encoder::RegionEncoder;
pub use pipeline::{transform, transform_dataset, Imputation, Transformed};

use serde::{Deserialize, Serialize};

/// Column order of every feature vector; persisted with the model.
pub const FEATURE_NAMES: [&str; 6] = [
    "region_code",
    "rainfall_mm",
    "temperature_c",
    "humidity_pct",
    "wind_speed_kmh",
    "soil_moisture_pct",
];

/// Index of the categorical column inside [`FEATURE_NAMES`].
pub const REGION_COLUMN: usize = 0;

/// Fixed-size numeric model input in [`FEATURE_NAMES`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Numeric columns only (everything after the region code).
    pub fn numeric(&self) -> &[f64] {
        &self.values[REGION_COLUMN + 1..]
    }
}
