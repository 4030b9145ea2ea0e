//! Observation schema, risk labels and the labeled dataset.

mod generator;
mod observation;

pub use generator::{anchor_observation, severity_label, severity_score, DatasetGenerator};
pub use observation::{Adjustment, Field, Observation, ObservationInput};

use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Closed set of Indian regions the model is trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    North,
    South,
    East,
    West,
    Central,
    Northeast,
}

/// Regional susceptibility used by the data generator (0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardProfile {
    pub flood_prone: f64,
    pub cyclone_prone: f64,
}

impl Region {
    pub const ALL: [Region; 6] = [
        Region::North,
        Region::South,
        Region::East,
        Region::West,
        Region::Central,
        Region::Northeast,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Region::North => "North",
            Region::South => "South",
            Region::East => "East",
            Region::West => "West",
            Region::Central => "Central",
            Region::Northeast => "Northeast",
        }
    }

    /// Coastal south and east carry both flood and cyclone exposure; the
    /// Brahmaputra basin is the most flood-prone; the interior is the least.
    pub fn profile(self) -> HazardProfile {
        let (flood_prone, cyclone_prone) = match self {
            Region::North => (0.3, 0.0),
            Region::South => (0.8, 0.6),
            Region::East => (0.7, 0.85),
            Region::West => (0.6, 0.5),
            Region::Central => (0.2, 0.0),
            Region::Northeast => (0.95, 0.1),
        };
        HazardProfile {
            flood_prone,
            cyclone_prone,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = RiskError;

    /// Case-insensitive; separators are ignored so "north-east" parses.
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        Region::ALL
            .into_iter()
            .find(|r| r.as_str().to_lowercase() == key)
            .ok_or_else(|| {
                RiskError::invalid("region", format!("`{s}` is not one of the supported regions"))
            })
    }
}

/// Ordered risk label. `Ord` follows severity, so the worst of two labels is `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    Low,
    Moderate,
    High,
    Critical,
}

impl Label {
    pub const ALL: [Label; 4] = [Label::Low, Label::Moderate, Label::High, Label::Critical];

    /// Position in [`Label::ALL`]; also the class index used by every classifier.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Label::ALL.get(i).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Low => "Low",
            Label::Moderate => "Moderate",
            Label::High => "High",
            Label::Critical => "Critical",
        }
    }

    pub fn recommended_actions(self) -> &'static [&'static str] {
        match self {
            Label::Low => &["Routine monitoring"],
            Label::Moderate => &[
                "Pre-position relief supplies",
                "Monitor river levels",
                "Alert hospitals",
            ],
            Label::High => &[
                "Evacuate low-lying areas",
                "Deploy NDRF teams",
                "Secure power grids",
            ],
            Label::Critical => &[
                "Order mandatory evacuation",
                "Activate the emergency operations centre",
                "Deploy NDRF teams",
                "Secure power grids",
            ],
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim();
        Label::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(key))
            .ok_or_else(|| RiskError::invalid("label", format!("`{s}` is not a risk label")))
    }
}

/// One labeled observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub observation: Observation,
    pub label: Label,
}

/// Ordered, read-only sequence of labeled observations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn label_counts(&self) -> BTreeMap<Label, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.records {
            *counts.entry(r.label).or_insert(0) += 1;
        }
        counts
    }

    pub fn distinct_labels(&self) -> BTreeSet<Label> {
        self.records.iter().map(|r| r.label).collect()
    }

    pub fn regions(&self) -> BTreeSet<Region> {
        self.records.iter().map(|r| r.observation.region).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_parsing_ignores_case_and_separators() {
        assert_eq!("north-east".parse::<Region>().unwrap(), Region::Northeast);
        assert_eq!("SOUTH".parse::<Region>().unwrap(), Region::South);
        assert_eq!(" central".parse::<Region>().unwrap(), Region::Central);
        assert!(matches!(
            "Atlantis".parse::<Region>(),
            Err(RiskError::InvalidInput { .. })
        ));
    }

    #[test]
    fn labels_are_ordered_by_severity() {
        assert!(Label::Low < Label::Moderate);
        assert!(Label::High < Label::Critical);
        assert_eq!(Label::Moderate.max(Label::High), Label::High);
        for (i, l) in Label::ALL.iter().enumerate() {
            assert_eq!(l.index(), i);
            assert_eq!(Label::from_index(i), Some(*l));
        }
        assert_eq!(Label::from_index(4), None);
    }

    #[test]
    fn dataset_counts_labels() {
        let obs = anchor_observation(Label::Low);
        let ds = Dataset::new(vec![
            Record { observation: obs.clone(), label: Label::Low },
            Record { observation: obs.clone(), label: Label::Low },
            Record { observation: obs, label: Label::High },
        ]);
        assert_eq!(ds.label_counts()[&Label::Low], 2);
        assert_eq!(ds.distinct_labels().len(), 2);
        assert_eq!(ds.regions().len(), 1);
    }
}
