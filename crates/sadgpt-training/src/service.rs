//! Boundary to the model training service.
//!
//! Model internals, tokenization, and the optimization loop live behind
//! [`ModelTrainingService`]. This crate only assembles what the service needs.

use crate::artifacts::RunId;
use crate::config::TrainingConfig;
use crate::progress::ProgressSink;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reference to a pretrained model (hub name or local directory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelHandle {
    pub name: String,
}

impl ModelHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Reference to the tokenizer paired with the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerHandle {
    pub name: String,
}

impl TokenizerHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Dataset built by the service: the corpus file cut into windows of
/// `block_size` tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub corpus_path: PathBuf,
    pub block_size: usize,
}

impl DatasetSpec {
    #[must_use]
    pub fn windowed(corpus_path: impl Into<PathBuf>, block_size: usize) -> Self {
        Self { corpus_path: corpus_path.into(), block_size }
    }
}

/// Batch collator settings. `mlm = false` means labels are the inputs
/// shifted by one (causal language modeling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollatorSpec {
    pub mlm: bool,
}

impl CollatorSpec {
    #[must_use]
    pub fn causal() -> Self {
        Self { mlm: false }
    }
}

/// Everything handed to the service for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub run_id: RunId,
    pub model: ModelHandle,
    pub tokenizer: TokenizerHandle,
    pub dataset: DatasetSpec,
    pub collator: CollatorSpec,
    pub config: TrainingConfig,
}

/// Completion metrics reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    #[serde(alias = "train_runtime")]
    pub train_runtime_secs: f64,
    pub train_samples_per_second: f64,
    pub train_loss: f64,
    #[serde(default, alias = "global_step")]
    pub global_steps: u64,
}

#[async_trait]
pub trait ModelTrainingService: Send + Sync {
    /// Handle to the trained model, owned by the service until saved.
    type Trained: Send;

    fn id(&self) -> &'static str;

    /// Run the configured epochs to completion.
    async fn submit(
        &self,
        request: &ServiceRequest,
        progress: &dyn ProgressSink,
    ) -> anyhow::Result<(Self::Trained, RunMetrics)>;

    /// Persist the trained model and its configuration into `output_dir`.
    async fn save(&self, trained: Self::Trained, output_dir: &Path) -> anyhow::Result<()>;
}
