use std::path::PathBuf;
use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("failed to load corpus from {}: {reason}", path.display())]
    CorpusLoad { path: PathBuf, reason: String },

    #[error("corpus serialization error: {0}")]
    Serialization(String),

    #[error("invalid training config: {field} {reason}")]
    ConfigValidation { field: &'static str, reason: String },

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("download error: {0}")]
    Download(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failure raised by the model training service, passed through as-is.
    #[error(transparent)]
    Service(anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TrainingError {
    pub(crate) fn corpus_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CorpusLoad { path: path.into(), reason: reason.to_string() }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::ConfigValidation { field, reason: reason.into() }
    }

    /// Name of the offending field for config validation errors.
    #[must_use]
    pub fn invalid_field(&self) -> Option<&'static str> {
        match self {
            Self::ConfigValidation { field, .. } => Some(*field),
            _ => None,
        }
    }
}
