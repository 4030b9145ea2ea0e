//! Disaster risk scoring for Indian regions.
//!
//! Modular structure:
//! - [`data`]: Observation schema, labels and the synthetic data generator
//! - [`features`]: Region encoding and feature vectors
//! - [`model`]: Classifiers, training/model selection and artifacts
//! - [`storage`]: Dataset CSV and versioned artifact persistence
//! - [`risk`]: Risk Matrix and the risk scorer
//! - [`simulate`]: What-If sweeps and grids
//! - [`logging`]: Structured logging

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod risk;
pub mod simulate;
pub mod storage;

pub use config::RiskConfig;
pub use data::{Dataset, DatasetGenerator, Field, Label, Observation, ObservationInput, Region};
pub use error::{Result, RiskError};
pub use features::{FeatureVector, RegionEncoder};
pub use logging::StructuredLogger;
pub use model::{train_and_publish, ArtifactHandle, ModelArtifact, Trainer};
pub use risk::{assess, RiskAssessment, RiskEngine, RiskMatrix};
pub use simulate::{grid, sweep, Simulator, ValueRange};
pub use storage::{read_dataset, write_dataset, ArtifactStore};
