//! Runtime configuration. Every section has defaults so a missing file is not an error.

use crate::error::{Result, RiskError};
use crate::risk::RiskMatrix;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// CSV dataset written by `generate` and read by `train`
    pub dataset_path: PathBuf,
    /// Directory holding versioned model artifacts and the CURRENT pointer
    pub artifact_dir: PathBuf,
    pub generator: GeneratorConfig,
    pub trainer: TrainerConfig,
    pub simulation: SimulationConfig,
    /// Expert rules applied after the model; defaults to the standard matrix
    pub matrix: RiskMatrix,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub rows: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Fraction of rows held out for model selection (0.0–1.0, exclusive)
    pub test_ratio: f64,
    /// Seed for the train/test shuffle
    pub seed: u64,
    /// Candidate algorithms, evaluated in order
    pub candidates: Vec<CandidateConfig>,
}

/// One candidate classifier and its hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum CandidateConfig {
    Logistic {
        epochs: usize,
        learning_rate: f64,
        l2: f64,
    },
    DecisionTree {
        max_depth: usize,
        min_samples_split: usize,
    },
    RandomForest {
        trees: usize,
        max_depth: usize,
        min_samples_split: usize,
        seed: u64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Upper bound on the number of combinations a grid run may evaluate
    pub max_grid_points: usize,
    /// Upper bound on the number of values a single sweep may evaluate
    pub max_sweep_points: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/disaster_data.csv"),
            artifact_dir: PathBuf::from("model"),
            generator: GeneratorConfig::default(),
            trainer: TrainerConfig::default(),
            simulation: SimulationConfig::default(),
            matrix: RiskMatrix::standard(),
            log: LogConfig::default(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 3000,
            seed: 42,
        }
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            candidates: CandidateConfig::defaults(),
        }
    }
}

impl CandidateConfig {
    /// Linear, single-tree and ensemble candidates.
    pub fn defaults() -> Vec<Self> {
        vec![
            CandidateConfig::Logistic {
                epochs: 400,
                learning_rate: 0.5,
                l2: 1e-4,
            },
            CandidateConfig::DecisionTree {
                max_depth: 8,
                min_samples_split: 4,
            },
            CandidateConfig::RandomForest {
                trees: 40,
                max_depth: 10,
                min_samples_split: 4,
                seed: 42,
            },
        ]
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_grid_points: 10_000,
            max_sweep_points: 10_000,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl RiskConfig {
    /// Load from a JSON file. A missing file yields defaults; an unreadable or
    /// malformed one is an error rather than a silent fallback.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path).map_err(|e| RiskError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&data).map_err(|e| RiskError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
