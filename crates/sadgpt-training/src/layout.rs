use crate::error::{TrainingError, TrainingResult};
use std::path::PathBuf;

/// Filesystem layout of a fine-tuned model directory.
///
/// ```text
/// <output_dir>/
///   training_manifest.json
///   config.json
///   <weights written by the training service>
/// ```
#[derive(Debug, Clone)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("training_manifest.json")
    }

    #[must_use]
    pub fn model_config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    #[must_use]
    pub fn bigram_checkpoint_path(&self) -> PathBuf {
        self.root.join("bigram_checkpoint.json")
    }

    /// Refuse to reuse a directory that already holds files.
    pub fn ensure_vacant(&self) -> TrainingResult<()> {
        match std::fs::read_dir(&self.root) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    return Err(TrainingError::Artifact(format!(
                        "output directory {} is not empty",
                        self.root.display()
                    )));
                }
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotADirectory => Err(TrainingError::Artifact(format!(
                "output path {} is not a directory",
                self.root.display()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub fn ensure_dir(&self) -> TrainingResult<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = RunLayout::new("sadgpt_model");
        assert_eq!(layout.manifest_path(), PathBuf::from("sadgpt_model/training_manifest.json"));
        assert_eq!(layout.model_config_path(), PathBuf::from("sadgpt_model/config.json"));
    }

    #[test]
    fn test_ensure_vacant() {
        let temp = TempDir::new().unwrap();
        assert!(RunLayout::new(temp.path().join("fresh")).ensure_vacant().is_ok());
        assert!(RunLayout::new(temp.path()).ensure_vacant().is_ok());

        std::fs::write(temp.path().join("pytorch_model.bin"), b"x").unwrap();
        assert!(RunLayout::new(temp.path()).ensure_vacant().is_err());
        assert!(RunLayout::new(temp.path().join("pytorch_model.bin")).ensure_vacant().is_err());
    }
}
