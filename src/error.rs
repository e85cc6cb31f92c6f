//! Error types for artifact loading, feature building and inference

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the prediction pipeline.
///
/// Every variant is terminal for the operation that produced it; nothing is
/// retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictorError {
    /// Artifact path does not exist
    #[error("artifact file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// Artifact exists but could not be decoded
    #[error("failed to load artifact {}: {reason}", .path.display())]
    LoadError { path: PathBuf, reason: String },

    /// A column the models expect was not produced by the feature builder
    #[error("schema mismatch: expected column '{column}' is missing from the feature record")]
    SchemaMismatch { column: String },

    /// The model rejected the input or failed while predicting
    #[error("inference failed in model '{model}': {reason}")]
    InferenceError { model: String, reason: String },

    /// Artifacts failed to load at startup, so no request can run
    #[error("predictor not ready: {0}")]
    NotReady(String),

    /// Operation called on a request in the wrong lifecycle state
    #[error("invalid request state: {0}")]
    InvalidState(String),
}

impl PredictorError {
    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::LoadError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn inference(model: &str, reason: impl ToString) -> Self {
        Self::InferenceError {
            model: model.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Stable label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "file_not_found",
            Self::LoadError { .. } => "load_error",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::InferenceError { .. } => "inference_error",
            Self::NotReady(_) => "not_ready",
            Self::InvalidState(_) => "invalid_state",
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictorError>;
