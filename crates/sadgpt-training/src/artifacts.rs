use crate::config::TrainingConfig;
use crate::error::{TrainingError, TrainingResult};
use crate::service::{ModelHandle, RunMetrics, TokenizerHandle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

/// Identifier for one fine-tuning run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Weights,
    Config,
    Tokenizer,
    Other,
}

impl ArtifactKind {
    /// Classify a file written by a training service by its name.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_ascii_lowercase();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();

        if name.starts_with("tokenizer") || name.starts_with("vocab") || name == "merges.txt" || name == "special_tokens_map.json" {
            Self::Tokenizer
        } else if name.ends_with("config.json") {
            Self::Config
        } else if name.contains("checkpoint") || matches!(ext.as_str(), "safetensors" | "bin" | "pt" | "ckpt") {
            Self::Weights
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingArtifact {
    pub kind: ArtifactKind,
    /// Path relative to the output directory.
    pub path: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingManifest {
    pub run_id: RunId,
    pub created_at: DateTime<Utc>,
    pub service: String,
    pub base_model: ModelHandle,
    pub tokenizer: TokenizerHandle,
    pub config: TrainingConfig,
    pub corpus_sha256: String,
    pub example_count: usize,
    pub metrics: RunMetrics,
    pub artifacts: Vec<TrainingArtifact>,
}

impl TrainingManifest {
    pub fn read(path: &Path) -> TrainingResult<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn write(&self, path: &Path) -> TrainingResult<()> {
        write_json(path, self)
    }
}

pub fn sha256_file(path: &Path) -> TrainingResult<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> TrainingResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Checksum every file under `dir`, skipping `exclude` (the manifest itself).
pub fn collect_artifacts(dir: &Path, exclude: &Path) -> TrainingResult<Vec<TrainingArtifact>> {
    if !dir.is_dir() {
        return Err(TrainingError::Artifact(format!(
            "training service did not create output directory {}",
            dir.display()
        )));
    }

    let mut artifacts = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| TrainingError::Artifact(e.to_string()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path == exclude {
            continue;
        }
        let relative = path.strip_prefix(dir).unwrap_or(path).to_path_buf();
        artifacts.push(TrainingArtifact {
            kind: ArtifactKind::for_path(path),
            path: relative,
            sha256: sha256_file(path)?,
        });
    }

    if artifacts.is_empty() {
        return Err(TrainingError::Artifact(format!("no model files were saved to {}", dir.display())));
    }
    Ok(artifacts)
}
