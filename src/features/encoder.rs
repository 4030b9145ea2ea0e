//! Region → integer code bijection fitted on the training data.

use crate::data::{Dataset, Region};
use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};

/// Codes are dense (`0..len`) and follow `Region` declaration order over the
/// regions actually seen during fitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEncoder {
    classes: Vec<Region>,
}

impl RegionEncoder {
    pub fn fit(dataset: &Dataset) -> Result<Self> {
        if dataset.is_empty() {
            return Err(RiskError::insufficient("cannot fit an encoder on an empty dataset"));
        }
        Ok(Self {
            classes: dataset.regions().into_iter().collect(),
        })
    }

    /// Unseen regions are an error, never a fallback code.
    pub fn encode(&self, region: Region) -> Result<u32> {
        self.classes
            .iter()
            .position(|r| *r == region)
            .map(|i| i as u32)
            .ok_or_else(|| RiskError::UnknownCategory {
                category: region.to_string(),
            })
    }

    pub fn decode(&self, code: u32) -> Option<Region> {
        self.classes.get(code as usize).copied()
    }

    pub fn classes(&self) -> &[Region] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
