//! Error taxonomy shared by every stage of the risk pipeline.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, RiskError>;

#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    /// A required field is missing or a value cannot be used even after clamping.
    #[error("invalid input for `{field}`: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Region absent from the fitted encoder.
    #[error("unknown category `{category}`: not present in the fitted encoder")]
    UnknownCategory { category: String },

    /// Dataset empty or too homogeneous to train a classifier.
    #[error("insufficient training data: {reason}")]
    InsufficientData { reason: String },

    /// The model produced something other than a finite probability per label.
    #[error("model output rejected: {reason}")]
    ModelOutput { reason: String },

    #[error("failed to load model artifact {path}: {reason}")]
    ArtifactLoad { path: PathBuf, reason: String },

    /// Dataset file rejected as a whole; `line` is 1-based and includes the header.
    #[error("malformed dataset at line {line}: {reason}")]
    DatasetFormat { line: usize, reason: String },

    #[error("invalid configuration {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RiskError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn insufficient(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
        }
    }

    pub(crate) fn artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ArtifactLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
